//! Configuration management for the Reachy bridge
//!
//! Priority per setting: environment > TOML file > default.

pub mod file;

use std::path::Path;
use std::time::Duration;

use url::Url;

pub use file::{BridgeConfigFile, config_file_path, load_config_file, load_config_file_at};

use crate::announce::{DEFAULT_ANNOUNCE_INTERVAL, DEFAULT_LANGUAGE, DEFAULT_TEMPLATE, EMOTION_PLACEHOLDER};
use crate::gate::DEFAULT_ACTION_INTERVAL;
use crate::robot::{DEFAULT_DAEMON_URL, EMOTIONS_LIBRARY};
use crate::{Error, Result};

/// Default per-request daemon timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Robot daemon connection
    pub robot: RobotConfig,

    /// Action gate settings
    pub actions: ActionsConfig,

    /// Spoken announcements
    pub announce: AnnounceConfig,
}

/// Robot daemon configuration
#[derive(Debug, Clone)]
pub struct RobotConfig {
    /// Daemon base URL
    pub url: Url,

    /// Media backend the bridge expects ("default", "gstreamer", "webrtc")
    ///
    /// Advisory only: the daemon chooses its media backend when it starts.
    /// The value is logged on connect and sent with the status request.
    pub media_backend: String,

    /// Recorded-move dataset
    pub moves_dataset: String,

    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Action gate configuration
#[derive(Debug, Clone)]
pub struct ActionsConfig {
    /// Minimum spacing between executed actions
    pub interval: Duration,

    /// Extra accepted action tags
    pub extra: Vec<String>,
}

/// Announcement configuration
#[derive(Debug, Clone)]
pub struct AnnounceConfig {
    pub enabled: bool,

    /// Cooldown before repeating the same emotion
    pub interval: Duration,

    pub language: String,

    /// Text with an `{emotion}` placeholder
    pub template: String,

    /// Speech backend
    pub provider: TtsProviderKind,

    /// `OpenAI` voice identifier
    pub voice: String,

    /// `OpenAI` TTS model
    pub model: String,

    /// `OpenAI` speed multiplier (0.25 to 4.0)
    pub speed: f32,

    /// `OpenAI` API key
    pub openai_api_key: Option<String>,
}

/// Speech synthesis backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsProviderKind {
    /// Key-less Google Translate TTS
    #[default]
    Google,
    /// `OpenAI` speech API
    OpenAi,
}

impl std::str::FromStr for TtsProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" | "gtts" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

impl Config {
    /// Load configuration from the standard config file and the environment
    ///
    /// # Errors
    ///
    /// Returns error if a setting is invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(load_config_file(), |key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit config file and the environment
    ///
    /// # Errors
    ///
    /// Returns error if a setting is invalid
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_sources(load_config_file_at(path), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a setting is invalid
    pub fn from_sources<F>(fc: BridgeConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Robot (env > toml > default)
        let url = env("REACHY_URL")
            .or(fc.robot.url)
            .unwrap_or_else(|| DEFAULT_DAEMON_URL.to_string());
        let url = Url::parse(&url)
            .map_err(|e| Error::Config(format!("invalid robot url {url:?}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!("robot url cannot address API paths: {url}")));
        }

        let request_timeout_secs = match env("REACHY_REQUEST_TIMEOUT") {
            Some(raw) => Some(parse_env("REACHY_REQUEST_TIMEOUT", &raw)?),
            None => fc.robot.request_timeout_secs,
        }
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }

        let robot = RobotConfig {
            url,
            media_backend: env("REACHY_MEDIA_BACKEND")
                .or(fc.robot.media_backend)
                .unwrap_or_else(|| "default".to_string()),
            moves_dataset: env("REACHY_MOVES_DATASET")
                .or(fc.robot.moves_dataset)
                .unwrap_or_else(|| EMOTIONS_LIBRARY.to_string()),
            request_timeout: Duration::from_secs(request_timeout_secs),
        };

        // Actions (env > toml > default)
        let action_interval = match env("REACHY_ACTION_INTERVAL") {
            Some(raw) => Some(parse_env("REACHY_ACTION_INTERVAL", &raw)?),
            None => fc.actions.interval_secs,
        };
        let actions = ActionsConfig {
            interval: interval_or("action interval", action_interval, DEFAULT_ACTION_INTERVAL)?,
            extra: env("REACHY_EXTRA_ACTIONS")
                .map(|csv| split_csv(&csv))
                .or(fc.actions.extra)
                .unwrap_or_default(),
        };

        // Announcements (env > toml > default)
        let enabled = match env("REACHY_ANNOUNCE") {
            Some(raw) => parse_bool("REACHY_ANNOUNCE", &raw)?,
            None => fc.announce.enabled.unwrap_or(true),
        };
        let announce_interval = match env("REACHY_ANNOUNCE_INTERVAL") {
            Some(raw) => Some(parse_env("REACHY_ANNOUNCE_INTERVAL", &raw)?),
            None => fc.announce.interval_secs,
        };
        let provider = env("REACHY_TTS_PROVIDER")
            .or(fc.announce.provider)
            .map_or(Ok(TtsProviderKind::default()), |p| p.parse())?;
        let speed = match env("REACHY_TTS_SPEED") {
            Some(raw) => Some(parse_env("REACHY_TTS_SPEED", &raw)?),
            None => fc.announce.speed,
        }
        .unwrap_or(1.0);
        if !(0.25..=4.0).contains(&speed) {
            return Err(Error::Config(format!("TTS speed {speed} outside 0.25..=4.0")));
        }

        let template = fc
            .announce
            .template
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        if !template.contains(EMOTION_PLACEHOLDER) {
            tracing::warn!(template = %template, "announcement template has no {{emotion}} placeholder");
        }

        let announce = AnnounceConfig {
            enabled,
            interval: interval_or("announce interval", announce_interval, DEFAULT_ANNOUNCE_INTERVAL)?,
            language: env("REACHY_ANNOUNCE_LANGUAGE")
                .or(fc.announce.language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            template,
            provider,
            voice: env("REACHY_TTS_VOICE")
                .or(fc.announce.voice)
                .unwrap_or_else(|| "alloy".to_string()),
            model: env("REACHY_TTS_MODEL")
                .or(fc.announce.model)
                .unwrap_or_else(|| "tts-1".to_string()),
            speed,
            openai_api_key: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|key| !key.is_empty()),
        };

        if announce.enabled
            && announce.provider == TtsProviderKind::OpenAi
            && announce.openai_api_key.is_none()
        {
            return Err(Error::Config(
                "OPENAI_API_KEY required for the openai TTS provider".to_string(),
            ));
        }

        Ok(Self {
            robot,
            actions,
            announce,
        })
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("invalid {key}={raw:?}: {e}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("invalid {key}={raw:?}: expected a boolean"))),
    }
}

fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn interval_or(name: &str, secs: Option<f64>, default: Duration) -> Result<Duration> {
    match secs {
        None => Ok(default),
        Some(secs) if secs.is_finite() && secs > 0.0 => Ok(Duration::from_secs_f64(secs)),
        Some(secs) => Err(Error::Config(format!("{name} must be positive, got {secs}"))),
    }
}
