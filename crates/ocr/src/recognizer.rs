use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde::Serialize;
use sightline_core::config::{VisionSettings, DEFAULT_LANGUAGE, DEFAULT_OCR_ENDPOINT};
use sightline_core::{remote, BoundingBox, CallOptions, ConfigError, ServiceError};
use std::future::Future;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::types::{Line, OcrDocument, Region, Word};

pub const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Failed to read image file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Abstraction over an OCR backend.
/// Implementations accept encoded image bytes and return the recognized document.
pub trait OcrBackend: Send + Sync {
    fn recognize(
        &self,
        image_bytes: &[u8],
        call: &CallOptions,
    ) -> impl Future<Output = Result<OcrDocument, OcrError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequestOptions {
    /// BCP-47 code, or `unk` to let the service detect it.
    pub language: String,
    pub detect_orientation: bool,
}

impl Default for OcrRequestOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            detect_orientation: true,
        }
    }
}

// ── Cloud backend ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    options: OcrRequestOptions,
}

impl OcrClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            options: OcrRequestOptions::default(),
        }
    }

    /// Client for the default public endpoint.
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self::new(DEFAULT_OCR_ENDPOINT, api_key)
    }

    pub fn from_settings(settings: &VisionSettings) -> Result<Self, ConfigError> {
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or(ConfigError::Missing("vision.api_key"))?;
        Ok(Self::new(&settings.endpoint, api_key).with_options(OcrRequestOptions {
            language: settings.language.clone(),
            detect_orientation: settings.detect_orientation,
        }))
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Options used when the client is driven through [`OcrBackend`].
    pub fn with_options(mut self, options: OcrRequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &OcrRequestOptions {
        &self.options
    }

    /// Let the service download the image itself.
    pub async fn recognize_url(
        &self,
        image_uri: &str,
        opts: &OcrRequestOptions,
        call: &CallOptions,
    ) -> Result<OcrDocument, OcrError> {
        #[derive(Serialize)]
        struct UrlBody<'a> {
            #[serde(rename = "Url")]
            url: &'a str,
        }

        info!(image_uri, language = %opts.language, "requesting OCR by URL");
        let request = self.post(opts).json(&UrlBody { url: image_uri });
        self.call(request, image_uri, call).await
    }

    pub async fn recognize_bytes(
        &self,
        image_bytes: &[u8],
        opts: &OcrRequestOptions,
        call: &CallOptions,
    ) -> Result<OcrDocument, OcrError> {
        info!(bytes = image_bytes.len(), language = %opts.language, "requesting OCR of image stream");
        let request = self
            .post(opts)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image_bytes.to_vec());
        self.call(request, "stream", call).await
    }

    pub async fn recognize_file(
        &self,
        path: &Path,
        opts: &OcrRequestOptions,
        call: &CallOptions,
    ) -> Result<OcrDocument, OcrError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| OcrError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(file = %path.display(), bytes = bytes.len(), language = %opts.language, "requesting OCR of file");
        let request = self
            .post(opts)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        self.call(request, &path.display().to_string(), call).await
    }

    fn post(&self, opts: &OcrRequestOptions) -> RequestBuilder {
        let detect = if opts.detect_orientation { "true" } else { "false" };
        self.http
            .post(&self.endpoint)
            .query(&[("language", opts.language.as_str()), ("detectOrientation", detect)])
            .header(API_KEY_HEADER, &self.api_key)
    }

    async fn call(
        &self,
        request: RequestBuilder,
        input: &str,
        call: &CallOptions,
    ) -> Result<OcrDocument, OcrError> {
        let context = format!("{input} failed to OCR");
        let body = remote::send(request, &context, call).await?;
        Ok(OcrDocument::from_json(&body, &context)?)
    }
}

impl OcrBackend for OcrClient {
    async fn recognize(&self, image_bytes: &[u8], call: &CallOptions) -> Result<OcrDocument, OcrError> {
        self.recognize_bytes(image_bytes, &self.options, call).await
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a preset document regardless of the image.
pub struct MockRecognizer {
    pub document: OcrDocument,
}

impl MockRecognizer {
    pub fn new(document: OcrDocument) -> Self {
        Self { document }
    }

    /// One region with one line per entry; words are split on whitespace and
    /// lines are spaced 100px apart.
    pub fn from_lines<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> Self {
        let lines: Vec<Line> = lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let y = i as u32 * 100;
                let words = text
                    .as_ref()
                    .split_whitespace()
                    .enumerate()
                    .map(|(j, w)| Word {
                        bounding_box: BoundingBox::new(j as u32 * 50, y, 40, 80),
                        text: w.to_string(),
                    })
                    .collect();
                Line { bounding_box: BoundingBox::new(0, y, 1000, 80), words }
            })
            .collect();

        let height = lines.len() as u32 * 100;
        Self::new(OcrDocument {
            language: Some("en".to_string()),
            text_angle: Some(0.0),
            orientation: Some("Up".to_string()),
            regions: vec![Region { bounding_box: BoundingBox::new(0, 0, 1000, height), lines }],
        })
    }
}

impl OcrBackend for MockRecognizer {
    async fn recognize(&self, _image_bytes: &[u8], _call: &CallOptions) -> Result<OcrDocument, OcrError> {
        Ok(self.document.clone())
    }
}
