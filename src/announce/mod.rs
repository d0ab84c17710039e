//! Spoken emotion announcements
//!
//! Announcements run beside motion: the [`AnnouncementThrottle`] decides
//! synchronously whether to speak, and the [`Announcer`] performs synthesis,
//! conversion and playback on a background task whose failure is only logged.

pub mod audio;
pub mod speech;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;

pub use speech::{SpeechSynthesizer, TextToSpeech};

use crate::robot::RobotConnection;
use crate::{Error, Result};

/// Placeholder replaced by the emotion label in the announcement template
pub const EMOTION_PLACEHOLDER: &str = "{emotion}";

/// Default announcement text
pub const DEFAULT_TEMPLATE: &str = "I detect you seem {emotion}";

/// Default speech language
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default cooldown before the same emotion is announced again
pub const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(5);

/// Decides when an emotion is worth announcing
///
/// A changed emotion is announced immediately; a repeated one only after
/// the cooldown has elapsed.
#[derive(Debug, Clone)]
pub struct AnnouncementThrottle {
    interval: Duration,
    last_emotion: Option<String>,
    last_announced: Option<Instant>,
}

impl AnnouncementThrottle {
    /// Create a throttle with the given cooldown
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emotion: None,
            last_announced: None,
        }
    }

    /// Check whether to announce `emotion` at `now`, recording it if so
    pub fn should_announce(&mut self, emotion: &str, now: Instant) -> bool {
        let changed = self.last_emotion.as_deref() != Some(emotion);
        let cooled_down = self
            .last_announced
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);

        if !(changed || cooled_down) {
            return false;
        }

        self.last_emotion = Some(emotion.to_string());
        self.last_announced = Some(now);
        true
    }

    /// Last emotion that passed the throttle
    #[must_use]
    pub fn last_emotion(&self) -> Option<&str> {
        self.last_emotion.as_deref()
    }
}

impl Default for AnnouncementThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_ANNOUNCE_INTERVAL)
    }
}

/// Speaks emotion announcements through the robot speaker
#[derive(Clone)]
pub struct Announcer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    language: String,
    template: String,
    speaker: Arc<Mutex<()>>,
}

impl Announcer {
    /// Create an announcer with the default template and language
    #[must_use]
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            language: DEFAULT_LANGUAGE.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            speaker: Arc::new(Mutex::new(())),
        }
    }

    /// Set the speech language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the announcement template
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Announcement text for an emotion
    #[must_use]
    pub fn text_for(&self, emotion: &str) -> String {
        self.template.replace(EMOTION_PLACEHOLDER, emotion)
    }

    /// Schedule an announcement on `tasks` without waiting for it
    ///
    /// Failures are logged inside the task and never reach the caller.
    pub fn spawn(
        &self,
        tasks: &mut JoinSet<()>,
        connection: Arc<dyn RobotConnection>,
        emotion: String,
    ) {
        let announcer = self.clone();
        tasks.spawn(async move {
            match announcer.announce(connection.as_ref(), &emotion).await {
                Ok(true) => tracing::debug!(emotion = %emotion, "announcement played"),
                Ok(false) => {}
                Err(e) => tracing::warn!(emotion = %emotion, error = %e, "announcement failed"),
            }
        });
    }

    /// Synthesize and play one announcement
    ///
    /// # Returns
    ///
    /// `false` when the emotion is empty and nothing was spoken
    ///
    /// # Errors
    ///
    /// Returns error if synthesis, conversion or playback fails
    pub async fn announce(&self, connection: &dyn RobotConnection, emotion: &str) -> Result<bool> {
        if emotion.trim().is_empty() {
            tracing::debug!("empty emotion, skipping announcement");
            return Ok(false);
        }

        let text = self.text_for(emotion);
        tracing::info!(emotion, text = %text, "announcing");

        let speech = self.synthesizer.synthesize(&text, &self.language).await?;
        let wav = tokio::task::spawn_blocking(move || audio::to_playback_file(&speech))
            .await
            .map_err(|e| Error::Audio(format!("conversion task failed: {e}")))??;

        let _speaker = self.speaker.lock().await;
        connection.play_sound(wav.path()).await?;
        Ok(true)
    }
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("language", &self.language)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}
