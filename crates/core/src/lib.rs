pub mod config;
pub mod geometry;
pub mod remote;

pub use config::{ConfigError, LuisRoute, Settings};
pub use geometry::{BoundingBox, BoundingBoxError};
pub use remote::{parse_json, send, CallOptions, ServiceError};
pub use tokio_util::sync::CancellationToken;
