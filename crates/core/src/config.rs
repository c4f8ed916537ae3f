use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::remote::CallOptions;

pub const DEFAULT_OCR_ENDPOINT: &str = "https://api.projectoxford.ai/vision/v1/ocr";
pub const DEFAULT_LUIS_ENDPOINT: &str = "https://westus.api.cognitive.microsoft.com/luis/v2.0/apps";
/// Let the OCR service detect the language.
pub const DEFAULT_LANGUAGE: &str = "unk";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// How the LUIS application id is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LuisRoute {
    /// `{endpoint}/{app_id}?subscription-key=..&q=..`
    #[default]
    Path,
    /// `{endpoint}?id={app_id}&subscription-key=..&q=..`
    Query,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub language: String,
    pub detect_orientation: bool,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            api_key: None,
            language: DEFAULT_LANGUAGE.to_string(),
            detect_orientation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LuisSettings {
    pub endpoint: String,
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub route: LuisRoute,
}

impl Default for LuisSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LUIS_ENDPOINT.to_string(),
            app_id: None,
            api_key: None,
            route: LuisRoute::Path,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-call deadline. No deadline when absent.
    pub timeout_secs: Option<u64>,
}

/// Service endpoints and credentials, read from TOML and then overridden
/// from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub vision: VisionSettings,
    pub luis: LuisSettings,
    pub http: HttpSettings,
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Like [`Settings::load`], but a file that does not exist yields defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `VISION_API_KEY`, `LUIS_APP_ID` and `LUIS_API_KEY` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_blank("VISION_API_KEY") {
            self.vision.api_key = Some(v);
        }
        if let Some(v) = non_blank("LUIS_APP_ID") {
            self.luis.app_id = Some(v);
        }
        if let Some(v) = non_blank("LUIS_API_KEY") {
            self.luis.api_key = Some(v);
        }
        self
    }

    pub fn require_vision_key(&self) -> Result<&str, ConfigError> {
        self.vision
            .api_key
            .as_deref()
            .ok_or(ConfigError::Missing("vision.api_key"))
    }

    /// Returns `(app_id, api_key)`.
    pub fn require_luis(&self) -> Result<(&str, &str), ConfigError> {
        let app_id = self.luis.app_id.as_deref().ok_or(ConfigError::Missing("luis.app_id"))?;
        let api_key = self.luis.api_key.as_deref().ok_or(ConfigError::Missing("luis.api_key"))?;
        Ok((app_id, api_key))
    }

    pub fn call_options(&self) -> CallOptions {
        CallOptions {
            timeout: self.http.timeout_secs.map(Duration::from_secs),
            cancel: None,
        }
    }
}
