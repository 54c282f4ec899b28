//! Identity types for Papyr entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Entity identifier. Random v4 UUIDs: ids double as unguessable public
/// share tokens, so they must not leak creation time.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new random EntityId.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}
