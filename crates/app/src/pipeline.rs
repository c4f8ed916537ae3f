use sightline_core::{CallOptions, ServiceError};
use sightline_imaging::{transform_bytes, ImageProcessor, ImagingError, OutputFormat, PixelTransform};
use sightline_intent::{IntentBackend, IntentResult};
use sightline_ocr::{Extractor, OcrBackend, OcrDocument, OcrError};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image stage failed: {0}")]
    Imaging(#[from] ImagingError),
    #[error("OCR stage failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Intent stage failed: {0}")]
    Intent(#[from] ServiceError),
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub document: OcrDocument,
    pub lines: Vec<String>,
    /// Every recognized word joined by single spaces.
    pub text: String,
    /// `None` when nothing was recognized, in which case the intent service is
    /// not called.
    pub intent: Option<IntentResult>,
}

/// Orchestrates: fetch → optional transform → OCR → extract → intent.
pub struct Pipeline<R: OcrBackend, I: IntentBackend> {
    processor: ImageProcessor,
    recognizer: R,
    intent: I,
}

impl<R: OcrBackend, I: IntentBackend> Pipeline<R, I> {
    pub fn new(recognizer: R, intent: I) -> Self {
        Self {
            processor: ImageProcessor::new(),
            recognizer,
            intent,
        }
    }

    pub fn with_processor(mut self, processor: ImageProcessor) -> Self {
        self.processor = processor;
        self
    }

    /// Fetch `uri` and run the remaining stages on the body.
    pub async fn run_uri(
        &self,
        uri: &str,
        transform: Option<&PixelTransform>,
        call: &CallOptions,
    ) -> Result<PipelineOutput, PipelineError> {
        let bytes = self.processor.fetch(uri, call).await?;
        info!(uri, bytes = bytes.len(), "fetched image");
        self.run_bytes(&bytes, transform, call).await
    }

    /// Run on an already-encoded image. A transformed image is re-encoded as
    /// PNG before OCR; an untransformed one is sent as given.
    pub async fn run_bytes(
        &self,
        image: &[u8],
        transform: Option<&PixelTransform>,
        call: &CallOptions,
    ) -> Result<PipelineOutput, PipelineError> {
        let transformed;
        let image = match transform {
            Some(t) => {
                transformed = transform_bytes(image, t, OutputFormat::Png)?;
                &transformed[..]
            }
            None => image,
        };

        let document = self.recognizer.recognize(image, call).await?;
        let lines = Extractor::lines(&document);
        let text = Extractor::text(&document);
        debug!(lines = lines.len(), chars = text.len(), "extracted text");

        let intent = if text.trim().is_empty() {
            info!("no text recognized, skipping intent detection");
            None
        } else {
            Some(self.intent.detect(&text, call).await?)
        };

        Ok(PipelineOutput {
            document,
            lines,
            text,
            intent,
        })
    }
}
