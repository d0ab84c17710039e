//! Reachy Bridge - Emotion-aware action execution for Reachy Mini
//!
//! This library turns discrete action commands from a perception pipeline
//! into robot behavior:
//! - Action validation and global throttling
//! - Motion dispatch to poses or recorded emotion moves
//! - Spoken emotion announcements in the background
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                Perception pipeline                   │
//! │        ActionCommand { action_type, parameters }     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Action Gate                        │
//! │   Throttle  │  Validation  │  Motion  │  Announcer  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │             Robot (daemon HTTP API)                  │
//! │   Poses  │  Recorded moves  │  Speaker              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod announce;
pub mod config;
pub mod error;
pub mod gate;
pub mod motion;
pub mod robot;

pub use action::{ActionCommand, ActionType, SupportedActions};
pub use announce::{AnnouncementThrottle, Announcer, SpeechSynthesizer, TextToSpeech};
pub use config::Config;
pub use error::{Error, Result};
pub use gate::ActionGate;
pub use motion::{Directive, MotionDispatcher, MoveResolver};
pub use robot::{DaemonRobot, LoggingRobot, PoseTarget, Robot, RobotConnection};
