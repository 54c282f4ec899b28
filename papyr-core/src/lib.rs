//! Papyr Core - Entity Types
//!
//! Pure data structures for the Papyr note-taking backend. All other crates
//! depend on this. This crate contains ONLY data types and the pure
//! share-access decision logic - no I/O, no framework code.

pub mod access;
pub mod entities;
pub mod enums;
pub mod error;
pub mod identity;

pub use access::{evaluate_share_access, AccessDecision, ShareView};
pub use entities::{
    Note, PublicUser, RefreshTokenRecord, ShareAssignment, ShareSession, User,
};
pub use enums::{NoteStatus, ShareType};
pub use error::CoreError;
pub use identity::{new_entity_id, EntityId, Timestamp};
