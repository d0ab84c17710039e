//! Motion dispatch
//!
//! Turns an [`ActionCommand`] into at most one physical directive: a direct
//! pose, a recorded move, or nothing.

mod resolver;

use std::time::Duration;

pub use resolver::MoveResolver;

use crate::Result;
use crate::action::{ActionCommand, ActionType};
use crate::robot::{PoseTarget, RobotConnection};

/// Time to reach the first frame of a recorded move
pub const MOVE_INITIAL_GOTO: Duration = Duration::from_secs(1);

const SHORT: Duration = Duration::from_millis(500);
const GENTLE: Duration = Duration::from_millis(800);
const TURN: Duration = Duration::from_secs(1);

const DE_ESCALATE_YAW_DEG: f64 = -15.0;
const RETREAT_YAW_DEG: f64 = -25.0;
const APPROACH_YAW_DEG: f64 = 15.0;

/// A single physical directive
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Direct joint command
    Pose(PoseTarget),
    /// Recorded move playback
    PlayMove(String),
}

/// Dispatches commands onto a robot connection
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionDispatcher {
    resolver: MoveResolver,
}

impl MotionDispatcher {
    /// Create a dispatcher
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolver: MoveResolver::new(),
        }
    }

    /// Execute a command's motion, reporting success
    ///
    /// Directive failures are logged and reported as `false`.
    pub async fn execute(&self, connection: &dyn RobotConnection, command: &ActionCommand) -> bool {
        let directive = self.plan(connection, command).await;
        match Self::issue(connection, directive.as_ref()).await {
            Ok(()) => {
                tracing::debug!(action = %command.action_type, ?directive, "motion executed");
                true
            }
            Err(e) => {
                tracing::warn!(action = %command.action_type, error = %e, "motion execution failed");
                false
            }
        }
    }

    /// Choose the directive for a command without issuing it
    pub async fn plan(
        &self,
        connection: &dyn RobotConnection,
        command: &ActionCommand,
    ) -> Option<Directive> {
        match &command.action_type {
            ActionType::Idle => Some(Directive::Pose(PoseTarget::antennas(0.0, SHORT))),
            ActionType::Acknowledge => Some(
                self.move_or(connection, "happy", PoseTarget::antennas(0.5, SHORT))
                    .await,
            ),
            ActionType::Comfort => Some(
                self.move_or(connection, "sad", PoseTarget::antennas(0.2, GENTLE))
                    .await,
            ),
            ActionType::DeEscalate => Some(Directive::Pose(PoseTarget::body_yaw_degrees(
                DE_ESCALATE_YAW_DEG,
                TURN,
            ))),
            ActionType::Reassure => Some(
                self.move_or(connection, "fearful", PoseTarget::antennas(0.3, GENTLE))
                    .await,
            ),
            // Speech for `speak` is handled by the announcer
            ActionType::Wait | ActionType::Speak => None,
            ActionType::Retreat => Some(Directive::Pose(PoseTarget::body_yaw_degrees(
                RETREAT_YAW_DEG,
                TURN,
            ))),
            ActionType::Approach => Some(Directive::Pose(PoseTarget::body_yaw_degrees(
                APPROACH_YAW_DEG,
                TURN,
            ))),
            ActionType::Gesture | ActionType::Stub => Some(
                self.move_or(connection, command.emotion(), PoseTarget::antennas(0.3, SHORT))
                    .await,
            ),
            ActionType::Other(_) => Some(
                self.move_or(connection, command.emotion(), PoseTarget::antennas(0.0, SHORT))
                    .await,
            ),
        }
    }

    async fn move_or(
        &self,
        connection: &dyn RobotConnection,
        emotion: &str,
        fallback: PoseTarget,
    ) -> Directive {
        self.resolver
            .resolve(connection, emotion)
            .await
            .map_or(Directive::Pose(fallback), Directive::PlayMove)
    }

    async fn issue(connection: &dyn RobotConnection, directive: Option<&Directive>) -> Result<()> {
        match directive {
            Some(Directive::Pose(target)) => connection.goto_target(target).await,
            Some(Directive::PlayMove(name)) => connection.play_move(name, MOVE_INITIAL_GOTO).await,
            None => Ok(()),
        }
    }
}
