use sightline_core::{remote, CallOptions};
use tracing::info;

use crate::engine::{transform_bytes, OutputFormat};
use crate::error::ImagingError;
use crate::transform::{Channel, TransformKind};

/// Fetches images over HTTP and runs them through the pixel engine.
#[derive(Debug, Clone, Default)]
pub struct ImageProcessor {
    client: reqwest::Client,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Plain GET of `uri`. The body is returned undecoded.
    pub async fn fetch(&self, uri: &str, call: &CallOptions) -> Result<Vec<u8>, ImagingError> {
        Ok(remote::send(self.client.get(uri), uri, call).await?)
    }

    /// Fetch, transform and re-encode. The transform is validated before
    /// anything goes over the network.
    pub async fn process_uri(
        &self,
        uri: &str,
        kind: &TransformKind,
        format: OutputFormat,
        call: &CallOptions,
    ) -> Result<Vec<u8>, ImagingError> {
        let transform = kind.build()?;
        let bytes = self.fetch(uri, call).await?;
        info!(uri, transform = transform.name(), %format, "processing image");
        transform_bytes(&bytes, &transform, format)
    }

    pub async fn invert(&self, uri: &str, format: OutputFormat, call: &CallOptions) -> Result<Vec<u8>, ImagingError> {
        self.process_uri(uri, &TransformKind::Invert, format, call).await
    }

    pub async fn greyscale(&self, uri: &str, format: OutputFormat, call: &CallOptions) -> Result<Vec<u8>, ImagingError> {
        self.process_uri(uri, &TransformKind::Greyscale, format, call).await
    }

    pub async fn gamma(
        &self,
        uri: &str,
        gamma: f64,
        format: OutputFormat,
        call: &CallOptions,
    ) -> Result<Vec<u8>, ImagingError> {
        self.process_uri(uri, &TransformKind::Gamma(gamma), format, call).await
    }

    pub async fn single_channel(
        &self,
        uri: &str,
        channel: Channel,
        clone: bool,
        format: OutputFormat,
        call: &CallOptions,
    ) -> Result<Vec<u8>, ImagingError> {
        self.process_uri(uri, &TransformKind::SingleChannel { channel, clone }, format, call)
            .await
    }
}
