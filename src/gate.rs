//! Action gate: the entry point for perception-driven commands
//!
//! Each call to [`ActionGate::execute`] runs:
//! connection check, global throttle, validation, motion, then an
//! optional background announcement. The boolean result is the motion
//! outcome; announcement failures never change it.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::action::{ActionCommand, SupportedActions};
use crate::announce::{AnnouncementThrottle, Announcer, DEFAULT_ANNOUNCE_INTERVAL};
use crate::motion::MotionDispatcher;
use crate::robot::{Robot, RobotConnection};
use crate::{Error, Result};

/// Default minimum spacing between executed actions
pub const DEFAULT_ACTION_INTERVAL: Duration = Duration::from_secs(2);

/// Per-connection timing state
struct Session {
    connection: Arc<dyn RobotConnection>,
    last_action: Option<Instant>,
    throttle: AnnouncementThrottle,
}

/// Validates, throttles and executes action commands on a robot
pub struct ActionGate {
    robot: Arc<dyn Robot>,
    dispatcher: MotionDispatcher,
    supported: SupportedActions,
    action_interval: Duration,
    announce_interval: Duration,
    announcer: Option<Announcer>,
    session: Option<Session>,
    tasks: JoinSet<()>,
}

impl ActionGate {
    /// Create a disconnected gate with announcements disabled
    #[must_use]
    pub fn new(robot: Arc<dyn Robot>) -> Self {
        Self {
            robot,
            dispatcher: MotionDispatcher::new(),
            supported: SupportedActions::default(),
            action_interval: DEFAULT_ACTION_INTERVAL,
            announce_interval: DEFAULT_ANNOUNCE_INTERVAL,
            announcer: None,
            session: None,
            tasks: JoinSet::new(),
        }
    }

    /// Set the minimum spacing between executed actions
    #[must_use]
    pub const fn with_action_interval(mut self, interval: Duration) -> Self {
        self.action_interval = interval;
        self
    }

    /// Accept additional producer-defined action tags
    #[must_use]
    pub fn with_extra_actions(mut self, extra: &[String]) -> Self {
        self.supported = SupportedActions::new(extra);
        self
    }

    /// Enable announcements with the given repeat cooldown
    #[must_use]
    pub fn with_announcer(mut self, announcer: Announcer, interval: Duration) -> Self {
        self.announcer = Some(announcer);
        self.announce_interval = interval;
        self
    }

    /// Open the robot connection
    ///
    /// Connecting an already connected gate is a no-op. Timing state starts
    /// fresh on every new connection.
    pub async fn connect(&mut self) -> bool {
        if self.session.is_some() {
            return true;
        }

        match self.robot.connect().await {
            Ok(connection) => {
                self.session = Some(Session {
                    connection,
                    last_action: None,
                    throttle: AnnouncementThrottle::new(self.announce_interval),
                });
                tracing::info!("robot connected");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to connect to robot");
                false
            }
        }
    }

    /// Release the robot connection
    ///
    /// Announcements still in flight are aborted so nothing reaches the
    /// speaker after release. Use [`Self::shutdown`] to let them finish.
    pub async fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        if !self.tasks.is_empty() {
            tracing::debug!(pending = self.tasks.len(), "aborting announcements");
            self.tasks.shutdown().await;
        }

        if let Err(e) = session.connection.disconnect().await {
            tracing::warn!(error = %e, "robot disconnect failed");
        }
        tracing::info!("robot disconnected");
    }

    /// Whether a connection is open
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Whether announcements are enabled
    #[must_use]
    pub const fn announcements_enabled(&self) -> bool {
        self.announcer.is_some()
    }

    /// Action tags accepted by [`Self::execute`], sorted
    #[must_use]
    pub fn supported_actions(&self) -> &BTreeSet<String> {
        self.supported.tags()
    }

    /// Execute one command
    ///
    /// Returns `false` when disconnected, when the command is invalid, or
    /// when the motion directive fails. A call inside the action interval is
    /// suppressed and reported as `true`.
    pub async fn execute(&mut self, command: &ActionCommand) -> bool {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(action = %command.action_type, "not connected, ignoring command");
            return false;
        };

        let now = Instant::now();
        if session
            .last_action
            .is_some_and(|last| now.saturating_duration_since(last) < self.action_interval)
        {
            tracing::trace!(action = %command.action_type, "throttled");
            return true;
        }
        session.last_action = Some(now);

        if let Err(e) = self.supported.validate(command) {
            tracing::debug!(action = %command.action_type, error = %e, "command rejected");
            return false;
        }

        let connection = Arc::clone(&session.connection);
        let success = self.dispatcher.execute(connection.as_ref(), command).await;

        if success {
            if let Some(announcer) = &self.announcer {
                let emotion = command.emotion();
                if session.throttle.should_announce(emotion, Instant::now()) {
                    while self.tasks.try_join_next().is_some() {}
                    announcer.spawn(&mut self.tasks, connection, emotion.to_string());
                }
            }
        }

        success
    }

    /// Number of announcements still running
    #[must_use]
    pub fn pending_announcements(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every in-flight announcement to finish
    pub async fn flush_announcements(&mut self) {
        while let Some(outcome) = self.tasks.join_next().await {
            if let Err(e) = outcome {
                if !e.is_cancelled() {
                    tracing::warn!(error = %e, "announcement task panicked");
                }
            }
        }
    }

    /// Wait up to `grace` for announcements, then disconnect
    ///
    /// Whatever is still running when the grace period ends is abandoned.
    pub async fn shutdown(&mut self, grace: Duration) {
        if !self.tasks.is_empty()
            && tokio::time::timeout(grace, self.flush_announcements())
                .await
                .is_err()
        {
            tracing::warn!(
                pending = self.tasks.len(),
                "announcements still running at shutdown, abandoning them"
            );
        }
        self.disconnect().await;
    }

    /// Current move catalog of the connected robot
    ///
    /// # Errors
    ///
    /// Returns error if disconnected or the catalog query fails
    pub async fn list_moves(&self) -> Result<Vec<String>> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::Connection("not connected".to_string()))?;
        session.connection.list_moves().await
    }

    /// Speak one announcement immediately, bypassing the throttle
    ///
    /// # Errors
    ///
    /// Returns error if disconnected, announcements are disabled, or the
    /// announcement fails
    pub async fn announce_now(&self, emotion: &str) -> Result<bool> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::Connection("not connected".to_string()))?;
        let announcer = self
            .announcer
            .as_ref()
            .ok_or_else(|| Error::Config("announcements are disabled".to_string()))?;
        announcer.announce(session.connection.as_ref(), emotion).await
    }
}
