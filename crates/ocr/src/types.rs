use serde::{Deserialize, Serialize};
use sightline_core::{parse_json, BoundingBox, ServiceError};

/// OCR response: regions, then lines, then words, in the reading order the
/// service reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OcrDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    pub regions: Vec<Region>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub bounding_box: BoundingBox,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub bounding_box: BoundingBox,
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub bounding_box: BoundingBox,
    pub text: String,
}

impl OcrDocument {
    /// Parse a response body. `context` names the input in error messages.
    pub fn from_json(body: &[u8], context: &str) -> Result<Self, ServiceError> {
        parse_json(body, context)
    }
}

impl Line {
    /// Word texts joined by single spaces. Empty for a line without words.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
