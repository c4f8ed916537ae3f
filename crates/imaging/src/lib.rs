pub mod buffer;
pub mod engine;
pub mod error;
pub mod processor;
pub mod transform;

pub use buffer::{PixelLock, RawImageBuffer};
pub use engine::{apply_transform, transform_bytes, try_apply_transform, OutputFormat};
pub use error::ImagingError;
pub use processor::ImageProcessor;
pub use transform::{gamma_table, Channel, PixelTransform, TransformKind};
