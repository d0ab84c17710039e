//! TOML configuration file loading
//!
//! Supports `~/.config/reachy-bridge/config.toml` as a persistent config
//! source. All fields are optional, the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct BridgeConfigFile {
    /// Robot daemon connection
    #[serde(default)]
    pub robot: RobotFileConfig,

    /// Action gate settings
    #[serde(default)]
    pub actions: ActionsFileConfig,

    /// Spoken announcements
    #[serde(default)]
    pub announce: AnnounceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Robot daemon configuration
#[derive(Debug, Default, Deserialize)]
pub struct RobotFileConfig {
    /// Daemon base URL (e.g. "http://reachy-mini.local:8000")
    pub url: Option<String>,

    /// Media backend ("default", "gstreamer", "webrtc")
    pub media_backend: Option<String>,

    /// Recorded-move dataset to play emotions from
    pub moves_dataset: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Action gate configuration
#[derive(Debug, Default, Deserialize)]
pub struct ActionsFileConfig {
    /// Minimum seconds between executed actions
    pub interval_secs: Option<f64>,

    /// Producer-defined tags accepted on top of the built-in set
    pub extra: Option<Vec<String>>,
}

/// Announcement configuration
#[derive(Debug, Default, Deserialize)]
pub struct AnnounceFileConfig {
    pub enabled: Option<bool>,

    /// Seconds before the same emotion is spoken again
    pub interval_secs: Option<f64>,

    pub language: Option<String>,

    /// Text with an `{emotion}` placeholder
    pub template: Option<String>,

    /// TTS provider ("google", "openai")
    pub provider: Option<String>,

    pub voice: Option<String>,
    pub model: Option<String>,
    pub speed: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `BridgeConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> BridgeConfigFile {
    config_file_path().map_or_else(BridgeConfigFile::default, |path| load_config_file_at(&path))
}

/// Load a TOML config file from an explicit path
///
/// Returns `BridgeConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file_at(path: &Path) -> BridgeConfigFile {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file");
        return BridgeConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                BridgeConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            BridgeConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/reachy-bridge/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("reachy-bridge").join("config.toml"))
}
