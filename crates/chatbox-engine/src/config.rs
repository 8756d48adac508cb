//! Configuration types for chatbox.
//!
//! Configuration lives in a JSON file. Every field has a default, so a
//! missing file or a partial one is always usable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name under the platform config/cache directories.
pub const APP_DIR: &str = "chatbox";

/// Main configuration for chatbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// URL of the assistant function.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Key sent as bearer token and `apikey` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Give up on a request after this many seconds. No limit when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Whether replies are read aloud at startup.
    #[serde(default = "default_auto_speak")]
    pub auto_speak: bool,

    /// Speech playback settings.
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Color theme.
    #[serde(default)]
    pub theme: ThemeName,

    /// UI tick interval in milliseconds.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

fn default_endpoint() -> String {
    "http://localhost:54321/functions/v1/chat-assistant".into()
}

fn default_auto_speak() -> bool {
    true
}

fn default_tick_rate_ms() -> u64 {
    250
}

/// Which speech backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeechBackend {
    /// Spawn a system text-to-speech command.
    #[default]
    System,
    /// No audio at all.
    Silent,
}

/// Speech playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub backend: SpeechBackend,

    /// Command template; platform default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// BCP 47 language tag.
    #[serde(default = "default_language")]
    pub language: String,

    /// Speaking rate multiplier.
    #[serde(default = "default_unit")]
    pub rate: f32,

    /// Pitch multiplier.
    #[serde(default = "default_unit")]
    pub pitch: f32,
}

fn default_language() -> String {
    "en-US".into()
}

fn default_unit() -> f32 {
    1.0
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: SpeechBackend::default(),
            command: None,
            language: default_language(),
            rate: default_unit(),
            pitch: default_unit(),
        }
    }
}

/// Named color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemeName {
    #[default]
    Mocha,
    Latte,
    HighContrast,
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            request_timeout_secs: None,
            auto_speak: default_auto_speak(),
            speech: SpeechConfig::default(),
            theme: ThemeName::default(),
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

/// Errors that can occur when loading or saving config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}
