use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use sightline::pipeline::Pipeline;
use sightline_core::{CallOptions, Settings};
use sightline_imaging::{Channel, ImageProcessor, OutputFormat, TransformKind};
use sightline_intent::{IntentResult, LuisClient};
use sightline_ocr::{Extractor, OcrClient, OcrDocument, OcrRequestOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch an image, apply a pixel transform and write the result
    Transform {
        /// Image URI
        uri: String,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, default_value_t = OutputFormat::Png)]
        format: OutputFormat,
        #[command(subcommand)]
        op: TransformOp,
    },
    /// Recognize printed text in an image URL or local file
    Ocr {
        /// `http(s)://` URL or file path
        source: String,
        /// BCP-47 language code; `unk` lets the service detect it
        #[arg(short, long)]
        language: Option<String>,
        #[arg(long)]
        no_detect_orientation: bool,
        #[arg(short, long, value_enum, default_value_t = OcrMode::Lines)]
        mode: OcrMode,
    },
    /// Detect intent and entities in a sentence
    Intent {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Fetch, optionally transform, OCR, then detect intent
    Pipeline {
        uri: String,
        #[command(subcommand)]
        op: Option<TransformOp>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Subcommand)]
pub enum TransformOp {
    /// 255 minus each channel
    Invert,
    /// BT.601 luma on all three channels
    Greyscale,
    /// Per-channel gamma correction
    Gamma {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Keep one channel
    Channel {
        channel: Channel,
        /// Zero the other channels instead of copying the kept one into them
        #[arg(long)]
        no_clone: bool,
    },
}

impl TransformOp {
    pub fn kind(self) -> TransformKind {
        match self {
            TransformOp::Invert => TransformKind::Invert,
            TransformOp::Greyscale => TransformKind::Greyscale,
            TransformOp::Gamma { value } => TransformKind::Gamma(value),
            TransformOp::Channel { channel, no_clone } => TransformKind::SingleChannel {
                channel,
                clone: !no_clone,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OcrMode {
    /// One line of text per recognized line
    Lines,
    /// `y<TAB>text` per line
    Positions,
    /// All words on one line
    Text,
    /// The full response document
    Json,
}

pub async fn run(cmd: Commands, settings: &Settings, call: &CallOptions) -> Result<()> {
    match cmd {
        Commands::Transform { uri, output, format, op } => {
            let bytes = ImageProcessor::new()
                .process_uri(&uri, &op.kind(), format, call)
                .await
                .with_context(|| format!("transform of {uri} failed"))?;
            write_output(output.as_deref(), &bytes)?;
        }
        Commands::Ocr { source, language, no_detect_orientation, mode } => {
            let client = OcrClient::from_settings(&settings.vision)?;
            let mut opts = client.options().clone();
            if let Some(language) = language {
                opts.language = language;
            }
            if no_detect_orientation {
                opts.detect_orientation = false;
            }
            let doc = recognize(&client, &source, &opts, call).await?;
            print_document(&doc, mode)?;
        }
        Commands::Intent { text } => {
            let client = LuisClient::from_settings(&settings.luis)?;
            let result = client.detect_intent(&text.join(" "), call).await?;
            print_intent(&result);
        }
        Commands::Pipeline { uri, op } => {
            let transform = op.map(|op| op.kind().build()).transpose()?;
            let pipeline = Pipeline::new(
                OcrClient::from_settings(&settings.vision)?,
                LuisClient::from_settings(&settings.luis)?,
            );
            let out = pipeline.run_uri(&uri, transform.as_ref(), call).await?;
            for line in &out.lines {
                println!("{line}");
            }
            match &out.intent {
                Some(result) => {
                    println!();
                    print_intent(result);
                }
                None => println!("(no text recognized)"),
            }
        }
    }
    Ok(())
}

async fn recognize(
    client: &OcrClient,
    source: &str,
    opts: &OcrRequestOptions,
    call: &CallOptions,
) -> Result<OcrDocument> {
    let doc = if is_remote(source) {
        client.recognize_url(source, opts, call).await?
    } else {
        client.recognize_file(Path::new(source), opts, call).await?
    };
    Ok(doc)
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "wrote image");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("Failed to write image to stdout")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn print_document(doc: &OcrDocument, mode: OcrMode) -> Result<()> {
    match mode {
        OcrMode::Lines => {
            for line in Extractor::lines(doc) {
                println!("{line}");
            }
        }
        OcrMode::Positions => {
            for (y, line) in Extractor::lines_with_position(doc) {
                println!("{y}\t{line}");
            }
        }
        OcrMode::Text => println!("{}", Extractor::text(doc)),
        OcrMode::Json => println!("{}", serde_json::to_string_pretty(doc)?),
    }
    Ok(())
}

fn print_intent(result: &IntentResult) {
    println!("{} ({:.2})", result.intent, result.intent_score);
    for group in result.entities.values() {
        let scores: Vec<String> = group.scores().iter().map(|s| format!("{s:.2}")).collect();
        println!("  {}: {} [{}]", group.name(), group.full_value(), scores.join(", "));
    }
}
