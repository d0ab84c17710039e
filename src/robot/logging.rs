//! Log-only robot backend for running without hardware

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{PoseTarget, Robot, RobotConnection};
use crate::Result;

/// Robot that logs directives instead of moving
#[derive(Debug, Clone, Default)]
pub struct LoggingRobot {
    moves: Vec<String>,
}

impl LoggingRobot {
    /// Create a logging robot with an empty move catalog
    #[must_use]
    pub const fn new() -> Self {
        Self { moves: Vec::new() }
    }

    /// Advertise a fixed move catalog
    #[must_use]
    pub fn with_moves(moves: Vec<String>) -> Self {
        Self { moves }
    }
}

#[async_trait]
impl Robot for LoggingRobot {
    async fn connect(&self) -> Result<Arc<dyn RobotConnection>> {
        tracing::info!(moves = self.moves.len(), "logging robot connected");
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl RobotConnection for LoggingRobot {
    async fn goto_target(&self, target: &PoseTarget) -> Result<()> {
        tracing::info!(
            antennas = ?target.antennas,
            body_yaw = ?target.body_yaw,
            duration_ms = target.duration.as_millis(),
            "goto target"
        );
        Ok(())
    }

    async fn list_moves(&self) -> Result<Vec<String>> {
        Ok(self.moves.clone())
    }

    async fn play_move(&self, name: &str, initial_goto: Duration) -> Result<()> {
        tracing::info!(
            move_name = name,
            initial_goto_ms = initial_goto.as_millis(),
            "play move"
        );
        Ok(())
    }

    async fn play_sound(&self, wav_path: &Path) -> Result<()> {
        let size = tokio::fs::metadata(wav_path).await?.len();
        tracing::info!(path = %wav_path.display(), bytes = size, "play sound");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        tracing::info!("logging robot disconnected");
        Ok(())
    }
}
