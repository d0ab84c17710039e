//! HTTP client for the Reachy Mini daemon REST API

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{PoseTarget, Robot, RobotConnection};
use crate::{Error, Result};

/// Daemon address when none is configured
pub const DEFAULT_DAEMON_URL: &str = "http://localhost:8000";

/// Recorded-move dataset holding the emotion moves
pub const EMOTIONS_LIBRARY: &str = "pollen-robotics/reachy-mini-emotions-library";

/// Robot reached through the local daemon
pub struct DaemonRobot {
    client: reqwest::Client,
    base_url: Url,
    dataset: String,
    media_backend: String,
}

impl DaemonRobot {
    /// Create a daemon client
    ///
    /// # Errors
    ///
    /// Returns error if the URL cannot address API paths or the HTTP client
    /// cannot be built
    pub fn new(
        base_url: Url,
        dataset: String,
        media_backend: String,
        timeout: Duration,
    ) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("invalid daemon url: {base_url}")));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            dataset,
            media_backend,
        })
    }

    /// Daemon status request URL
    ///
    /// The media backend is advisory: the daemon selects its backend at
    /// startup, the value only tags the status request so daemon logs show what the
    /// bridge expects.
    fn status_url(&self, connection: &DaemonConnection) -> Result<Url> {
        let mut url = connection.endpoint(&["api", "daemon", "status"])?;
        url.query_pairs_mut().append_pair("media_backend", &self.media_backend);
        Ok(url)
    }
}

#[async_trait]
impl Robot for DaemonRobot {
    async fn connect(&self) -> Result<Arc<dyn RobotConnection>> {
        let connection = DaemonConnection {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            dataset: self.dataset.clone(),
        };

        let status_url = self.status_url(&connection)?;
        let response = self
            .client
            .get(status_url)
            .send()
            .await
            .map_err(|e| Error::Connection(format!("daemon unreachable at {}: {e}", self.base_url)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Connection(format!("daemon status {status}: {body}")));
        }

        tracing::info!(
            url = %self.base_url,
            media_backend = %self.media_backend,
            "connected to robot daemon"
        );

        Ok(Arc::new(connection))
    }
}

/// Live handle on the daemon
///
/// The daemon serializes requests itself, so motion and speaker calls may
/// overlap from different tasks.
struct DaemonConnection {
    client: reqwest::Client,
    base_url: Url,
    dataset: String,
}

impl DaemonConnection {
    /// Build an API URL from path segments, keeping any base path prefix
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("invalid daemon url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Endpoint under the recorded-move dataset
    fn dataset_endpoint(&self, prefix: &[&str], suffix: &[&str]) -> Result<Url> {
        let segments: Vec<&str> = prefix
            .iter()
            .copied()
            .chain(self.dataset.split('/').filter(|s| !s.is_empty()))
            .chain(suffix.iter().copied())
            .collect();
        self.endpoint(&segments)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Directive(format!("{what} failed with {status}: {body}")))
    }
}

#[async_trait]
impl RobotConnection for DaemonConnection {
    async fn goto_target(&self, target: &PoseTarget) -> Result<()> {
        let url = self.endpoint(&["api", "move", "goto"])?;
        let response = self.client.post(url).json(target).send().await?;
        Self::check(response, "goto").await?;
        Ok(())
    }

    async fn list_moves(&self) -> Result<Vec<String>> {
        let url = self.dataset_endpoint(&["api", "move", "recorded-move-datasets", "list"], &[])?;
        let response = self.client.get(url).send().await?;
        let moves = Self::check(response, "list moves")
            .await?
            .json::<Vec<String>>()
            .await?;
        Ok(moves)
    }

    async fn play_move(&self, name: &str, initial_goto: Duration) -> Result<()> {
        #[derive(serde::Serialize)]
        struct PlayRequest {
            initial_goto_duration: f64,
        }

        let url = self.dataset_endpoint(
            &["api", "move", "play", "recorded-move-dataset"],
            &[name],
        )?;
        let response = self
            .client
            .post(url)
            .json(&PlayRequest {
                initial_goto_duration: initial_goto.as_secs_f64(),
            })
            .send()
            .await?;
        Self::check(response, "play move").await?;
        Ok(())
    }

    async fn play_sound(&self, wav_path: &Path) -> Result<()> {
        let audio = tokio::fs::read(wav_path).await?;
        let url = self.endpoint(&["api", "media", "play_sound"])?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "audio/wav")
            .body(audio)
            .send()
            .await?;
        Self::check(response, "play sound").await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        tracing::debug!(url = %self.base_url, "released daemon connection");
        Ok(())
    }
}
