//! Emotion label to recorded-move resolution

use crate::robot::RobotConnection;

/// Alias groups tried in order when the label has no exact match
const ALIASES: &[(&str, &[&str])] = &[
    ("happy", &["happy", "joy", "smile"]),
    ("sad", &["sad", "sadness", "crying"]),
    ("angry", &["angry", "anger"]),
    ("fearful", &["fearful", "fear", "scared"]),
    ("surprised", &["surprised", "surprise"]),
    ("disgusted", &["disgusted", "disgust"]),
    ("neutral", &["neutral", "calm"]),
];

/// Maps emotion labels onto the robot's live move catalog
///
/// Resolution order:
/// 1. exact (case-insensitive) match
/// 2. first alias of the label's group present in the catalog
/// 3. the lexicographically smallest move in the catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveResolver;

impl MoveResolver {
    /// Create a resolver
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve against the connection's current catalog
    ///
    /// The catalog is fetched on every call; a failed fetch counts as empty.
    pub async fn resolve(&self, connection: &dyn RobotConnection, emotion: &str) -> Option<String> {
        let available = match connection.list_moves().await {
            Ok(moves) => moves,
            Err(e) => {
                tracing::debug!(error = %e, "move catalog unavailable");
                Vec::new()
            }
        };
        self.pick(&available, emotion)
    }

    /// Resolve against an explicit catalog
    #[must_use]
    pub fn pick(&self, available: &[String], emotion: &str) -> Option<String> {
        let label = emotion.to_lowercase();
        let find = |candidate: &str| {
            available
                .iter()
                .find(|name| name.eq_ignore_ascii_case(candidate))
                .cloned()
        };

        if let Some(name) = find(label.as_str()) {
            return Some(name);
        }

        let fallback_group = [label.as_str()];
        let group = ALIASES
            .iter()
            .find(|(key, _)| *key == label)
            .map_or(&fallback_group[..], |(_, aliases)| *aliases);

        if let Some(name) = group.iter().copied().find_map(&find) {
            return Some(name);
        }

        let fallback = available.iter().min().cloned();
        if let Some(name) = &fallback {
            tracing::debug!(emotion, move_name = %name, "no matching move, using catalog fallback");
        }
        fallback
    }
}
