use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pixel-space rectangle where a text element was detected.
///
/// On the wire this is a single `"x,y,width,height"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoundingBoxError {
    #[error("Bounding box '{0}' must have exactly 4 comma-separated fields")]
    FieldCount(String),
    #[error("Bounding box '{input}' has an invalid {field} value '{value}'")]
    InvalidField {
        input: String,
        field: &'static str,
        value: String,
    },
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Top edge. This is the field the line-position extractor reports.
    pub fn top(&self) -> u32 {
        self.y
    }
}

impl FromStr for BoundingBox {
    type Err = BoundingBoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const NAMES: [&str; 4] = ["x", "y", "width", "height"];

        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != NAMES.len() {
            return Err(BoundingBoxError::FieldCount(s.to_string()));
        }

        let mut fields = [0u32; 4];
        for (i, (raw, field)) in parts.iter().zip(NAMES).enumerate() {
            let raw = raw.trim();
            let invalid = || BoundingBoxError::InvalidField {
                input: s.to_string(),
                field,
                value: raw.to_string(),
            };
            // Digits only: `u32::from_str` would also take a leading `+`.
            if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            fields[i] = raw.parse::<u32>().map_err(|_| invalid())?;
        }

        let [x, y, width, height] = fields;
        Ok(BoundingBox { x, y, width, height })
    }
}

impl TryFrom<String> for BoundingBox {
    type Error = BoundingBoxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BoundingBox> for String {
    fn from(b: BoundingBox) -> Self {
        b.to_string()
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}
