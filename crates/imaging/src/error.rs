use sightline_core::ServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] ServiceError),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
