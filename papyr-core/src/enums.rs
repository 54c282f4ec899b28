//! Enum types for Papyr entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Lifecycle status of a note. Transitions are caller-driven; there is no
/// automatic expiry or background sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    Active,
    Archived,
    /// Soft-deleted. The row survives until an explicit permanent delete.
    Deleted,
}

impl NoteStatus {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Active => "active",
            NoteStatus::Archived => "archived",
            NoteStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(NoteStatus::Active),
            "archived" => Ok(NoteStatus::Archived),
            "deleted" => Ok(NoteStatus::Deleted),
            other => Err(crate::error::CoreError::InvalidEnumValue {
                enum_name: "NoteStatus",
                value: other.to_string(),
            }),
        }
    }
}

/// Visibility of a share session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareType {
    /// Anyone with the public link may read the note.
    Public,
    /// Only users with an explicit assignment may read the note.
    Private,
}

impl ShareType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareType::Public => "public",
            ShareType::Private => "private",
        }
    }
}

impl fmt::Display for ShareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShareType {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(ShareType::Public),
            "private" => Ok(ShareType::Private),
            other => Err(crate::error::CoreError::InvalidEnumValue {
                enum_name: "ShareType",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_status_roundtrip() {
        for status in [NoteStatus::Active, NoteStatus::Archived, NoteStatus::Deleted] {
            assert_eq!(status.as_str().parse::<NoteStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_note_status_rejects_unknown() {
        assert!("pending".parse::<NoteStatus>().is_err());
    }

    #[test]
    fn test_share_type_roundtrip() {
        for ty in [ShareType::Public, ShareType::Private] {
            assert_eq!(ty.as_str().parse::<ShareType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&NoteStatus::Archived).unwrap(),
            "\"archived\""
        );
        assert_eq!(
            serde_json::to_string(&ShareType::Private).unwrap(),
            "\"private\""
        );
    }
}
