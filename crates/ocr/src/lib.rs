pub mod extract;
pub mod recognizer;
pub mod types;

pub use extract::Extractor;
pub use recognizer::{MockRecognizer, OcrBackend, OcrClient, OcrError, OcrRequestOptions, API_KEY_HEADER};
pub use types::{Line, OcrDocument, Region, Word};
