//! Change-tracking state of an entity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pending operation of a tracked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeState {
    /// Entity will be inserted
    Added,
    /// Entity has modified fields and will be updated
    Modified,
    /// Entity will be deleted
    Deleted,
    /// Entity is tracked but has no pending change
    Unchanged,
}

impl ChangeState {
    /// Whether the entity takes part in the next commit
    pub fn has_pending_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    /// Whether audit entries carry the original value
    pub fn records_old_values(&self) -> bool {
        matches!(self, Self::Deleted | Self::Modified | Self::Unchanged)
    }

    /// Whether audit entries carry the current value
    pub fn records_new_values(&self) -> bool {
        matches!(self, Self::Added | Self::Modified | Self::Unchanged)
    }

    /// Parse a state from its action name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "added" => Some(Self::Added),
            "modified" => Some(Self::Modified),
            "deleted" => Some(Self::Deleted),
            "unchanged" => Some(Self::Unchanged),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "Added"),
            Self::Modified => write!(f, "Modified"),
            Self::Deleted => write!(f, "Deleted"),
            Self::Unchanged => write!(f, "Unchanged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(ChangeState::Added.to_string(), "Added");
        assert_eq!(ChangeState::Modified.to_string(), "Modified");
        assert_eq!(ChangeState::Deleted.to_string(), "Deleted");
        assert_eq!(ChangeState::Unchanged.to_string(), "Unchanged");
    }

    #[test]
    fn test_value_sides() {
        assert!(!ChangeState::Added.records_old_values());
        assert!(ChangeState::Added.records_new_values());
        assert!(ChangeState::Deleted.records_old_values());
        assert!(!ChangeState::Deleted.records_new_values());
        assert!(ChangeState::Modified.records_old_values());
        assert!(ChangeState::Unchanged.records_new_values());
    }

    #[test]
    fn test_parse() {
        assert_eq!(ChangeState::parse("modified"), Some(ChangeState::Modified));
        assert_eq!(ChangeState::parse("Detached"), None);
    }
}
