//! Core entity structures

use crate::{EntityId, NoteStatus, ShareType, Timestamp};
use serde::{Deserialize, Serialize};

/// A registered user. Password fields never leave the persistence layer;
/// API responses use [`PublicUser`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub created_at: Timestamp,
}

impl User {
    /// The externally visible projection of a user.
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public user fields, safe to return from any endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: EntityId,
    pub username: String,
    pub email: String,
}

/// One stored refresh-token lineage for a (user, device) pair.
///
/// `token_hash` is a keyed hash of the raw token, never the raw token
/// itself: a credential-store leak must not yield usable tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub user_id: EntityId,
    pub token_hash: String,
    pub device: String,
    pub created_at: Timestamp,
}

/// A note, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: EntityId,
    pub user_id: EntityId,
    pub title: String,
    pub content: String,
    pub status: NoteStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// The single sharing configuration attached to one note.
///
/// At most one session exists per note (unique constraint on `note_id`);
/// re-sharing updates the session in place and preserves `public_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSession {
    pub id: EntityId,
    pub note_id: EntityId,
    /// Opaque unguessable token used in public share links.
    pub public_id: EntityId,
    pub share_type: ShareType,
    /// Lazy expiry: checked at read time, never swept in the background.
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl ShareSession {
    /// Whether the session has passed its expiry at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(expires) if expires <= now)
    }
}

/// Explicit grant of a private share session to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareAssignment {
    pub share_session_id: EntityId,
    pub user_id: EntityId,
}
