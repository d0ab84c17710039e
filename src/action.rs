//! Action commands produced by the perception pipeline
//!
//! An [`ActionCommand`] is a discrete intent (an action tag plus free-form
//! parameters). Known tags map to [`ActionType`] variants; anything else is
//! carried through as [`ActionType::Other`] so producers can introduce new
//! tags without breaking the wire format.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Parameter key carrying the detected emotion label
pub const EMOTION_PARAM: &str = "emotion";

/// Emotion assumed when a command carries none
pub const DEFAULT_EMOTION: &str = "neutral";

/// Action tags every handler understands
pub const BASE_ACTIONS: &[&str] = &[
    "idle",
    "acknowledge",
    "comfort",
    "de_escalate",
    "reassure",
    "wait",
    "retreat",
    "approach",
    "speak",
    "gesture",
];

/// Action tags this handler adds on top of [`BASE_ACTIONS`]
pub const HANDLER_ACTIONS: &[&str] = &["stub"];

/// Kind of physical behavior requested by a command
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    /// Return expressive actuators to neutral
    Idle,
    /// Acknowledge the subject (happy move)
    Acknowledge,
    /// Comfort the subject (sad move)
    Comfort,
    /// Turn the body away from the subject
    DeEscalate,
    /// Reassure the subject (fearful move)
    Reassure,
    /// Hold the current pose
    Wait,
    /// Turn further away than de-escalate
    Retreat,
    /// Turn towards the subject
    Approach,
    /// Speech only, no motion
    Speak,
    /// Play the move matching the command's emotion
    Gesture,
    /// Same as gesture, kept for producers that emit placeholder actions
    Stub,
    /// Any producer-defined tag
    Other(String),
}

impl ActionType {
    /// Canonical tag for this action
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Acknowledge => "acknowledge",
            Self::Comfort => "comfort",
            Self::DeEscalate => "de_escalate",
            Self::Reassure => "reassure",
            Self::Wait => "wait",
            Self::Retreat => "retreat",
            Self::Approach => "approach",
            Self::Speak => "speak",
            Self::Gesture => "gesture",
            Self::Stub => "stub",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for ActionType {
    fn from(tag: &str) -> Self {
        match tag {
            "idle" => Self::Idle,
            "acknowledge" => Self::Acknowledge,
            "comfort" => Self::Comfort,
            "de_escalate" => Self::DeEscalate,
            "reassure" => Self::Reassure,
            "wait" => Self::Wait,
            "retreat" => Self::Retreat,
            "approach" => Self::Approach,
            "speak" => Self::Speak,
            "gesture" => Self::Gesture,
            "stub" => Self::Stub,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ActionType {
    fn from(tag: String) -> Self {
        match Self::from(tag.as_str()) {
            Self::Other(_) => Self::Other(tag),
            known => known,
        }
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        match action {
            ActionType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete intent from the perception layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCommand {
    /// Requested behavior
    pub action_type: ActionType,

    /// Free-form parameters; absent or `null` means empty
    #[serde(default, deserialize_with = "nullable_map")]
    pub parameters: Map<String, Value>,
}

fn nullable_map<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ActionCommand {
    /// Create a command without parameters
    #[must_use]
    pub fn new(action_type: impl Into<ActionType>) -> Self {
        Self {
            action_type: action_type.into(),
            parameters: Map::new(),
        }
    }

    /// Attach an emotion label
    #[must_use]
    pub fn with_emotion(mut self, emotion: impl Into<String>) -> Self {
        self.parameters
            .insert(EMOTION_PARAM.to_string(), Value::String(emotion.into()));
        self
    }

    /// Emotion label carried by this command, `"neutral"` when absent
    #[must_use]
    pub fn emotion(&self) -> &str {
        self.parameters
            .get(EMOTION_PARAM)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_EMOTION)
    }

    /// Parse a command from a JSON document
    ///
    /// # Errors
    ///
    /// Returns error if the document is not a valid command
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Set of action tags a handler accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedActions {
    tags: BTreeSet<String>,
}

impl SupportedActions {
    /// Base actions plus this handler's extensions plus operator-declared tags
    #[must_use]
    pub fn new(extra: &[String]) -> Self {
        let tags = BASE_ACTIONS
            .iter()
            .chain(HANDLER_ACTIONS)
            .map(ToString::to_string)
            .chain(
                extra
                    .iter()
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty()),
            )
            .collect();
        Self { tags }
    }

    /// Whether `action` is accepted
    #[must_use]
    pub fn contains(&self, action: &ActionType) -> bool {
        self.tags.contains(action.as_str())
    }

    /// Accepted tags in lexicographic order
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Check that a command is well formed and supported
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first violated rule
    pub fn validate(&self, command: &ActionCommand) -> Result<()> {
        if command.action_type.as_str().trim().is_empty() {
            return Err(Error::Validation("empty action type".to_string()));
        }

        if let Some(emotion) = command.parameters.get(EMOTION_PARAM) {
            if !emotion.is_string() {
                return Err(Error::Validation(format!(
                    "emotion parameter must be a string, got {emotion}"
                )));
            }
        }

        if !self.contains(&command.action_type) {
            return Err(Error::Validation(format!(
                "unsupported action: {}",
                command.action_type
            )));
        }

        Ok(())
    }
}

impl Default for SupportedActions {
    fn default() -> Self {
        Self::new(&[])
    }
}
