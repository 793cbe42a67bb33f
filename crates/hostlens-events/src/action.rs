//! Event action enums.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What happened to a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProcessAction {
    /// Process appeared since the previous poll cycle.
    Started,
}

/// What happened to a filesystem path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FileAction {
    /// Path was created.
    Created,
    /// Path contents or metadata changed.
    Modified,
    /// Path was removed.
    Deleted,
    /// Path was renamed.
    Moved,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_action_display_snake_case() {
        assert_eq!(ProcessAction::Started.to_string(), "started");
        assert_eq!(FileAction::Created.to_string(), "created");
        assert_eq!(FileAction::Moved.to_string(), "moved");
    }

    #[test]
    fn test_action_parse_round_trip() {
        for action in [
            FileAction::Created,
            FileAction::Modified,
            FileAction::Deleted,
            FileAction::Moved,
        ] {
            let parsed = FileAction::from_str(&action.to_string()).unwrap();
            assert_eq!(parsed, action);
        }
    }
}
