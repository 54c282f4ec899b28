//! Papyr API - REST API Layer
//!
//! This crate provides the HTTP backend for the Papyr note-taking app.
//! It exposes REST endpoints (Axum) for accounts and sessions, note CRUD,
//! and note sharing, backed by PostgreSQL.
//!
//! Authentication uses short-lived JWT access tokens paired with
//! server-tracked refresh tokens stored per (user, device).

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod session;
pub mod sharing;
pub mod validation;

// Re-export commonly used types
pub use auth::{
    authenticate, decode_token, generate_token, validate_token, AuthConfig, AuthContext, Claims,
    SigningSecret, TokenKind,
};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use guard::{require_access, require_owner, GuardState};
pub use middleware::{
    auth_middleware, optional_auth_middleware, AuthExtractor, AuthMiddlewareState,
    MaybeAuthExtractor,
};
pub use routes::create_api_router;
pub use session::{SessionManager, SessionOutcome, TokenPair};
pub use sharing::{SharedNoteView, ShareStatus, SharingManager};
