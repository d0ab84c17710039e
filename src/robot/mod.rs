//! Robot actuation surface
//!
//! A [`Robot`] opens a [`RobotConnection`], the live handle through which
//! pose directives, recorded-move playback and speaker output are issued.
//! Backends:
//! - [`DaemonRobot`]: HTTP client for the Reachy Mini daemon
//! - [`LoggingRobot`]: no hardware, logs every directive

mod daemon;
mod logging;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub use daemon::{DaemonRobot, DEFAULT_DAEMON_URL, EMOTIONS_LIBRARY};
pub use logging::LoggingRobot;

use crate::Result;

/// Target pose for a direct joint command
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseTarget {
    /// Left and right antenna positions (radians)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antennas: Option<[f64; 2]>,

    /// Body rotation around the vertical axis (radians)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_yaw: Option<f64>,

    /// Time to reach the target
    #[serde(serialize_with = "seconds")]
    pub duration: Duration,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn seconds<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

impl PoseTarget {
    /// Move both antennas to the same position
    #[must_use]
    pub const fn antennas(position: f64, duration: Duration) -> Self {
        Self {
            antennas: Some([position, position]),
            body_yaw: None,
            duration,
        }
    }

    /// Rotate the body to `degrees` (positive turns towards the subject)
    #[must_use]
    pub fn body_yaw_degrees(degrees: f64, duration: Duration) -> Self {
        Self {
            antennas: None,
            body_yaw: Some(degrees.to_radians()),
            duration,
        }
    }
}

/// Connects to the actuation surface
#[async_trait]
pub trait Robot: Send + Sync {
    /// Open a live connection
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Connection`] if the robot is unreachable
    async fn connect(&self) -> Result<Arc<dyn RobotConnection>>;
}

/// Live connection to the robot
///
/// Shared between the command path and background announcement tasks.
/// Implementations must tolerate one caller issuing motion while another
/// plays audio.
#[async_trait]
pub trait RobotConnection: Send + Sync {
    /// Drive joints to a target pose
    async fn goto_target(&self, target: &PoseTarget) -> Result<()>;

    /// Names of the recorded moves currently available
    async fn list_moves(&self) -> Result<Vec<String>>;

    /// Play a recorded move, reaching its first frame over `initial_goto`
    async fn play_move(&self, name: &str, initial_goto: Duration) -> Result<()>;

    /// Play a WAV file through the robot speaker
    async fn play_sound(&self, wav_path: &Path) -> Result<()>;

    /// Release the connection
    async fn disconnect(&self) -> Result<()>;
}
