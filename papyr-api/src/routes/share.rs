//! Share REST API Routes
//!
//! Two routers live here. The owner router manages a note's share session
//! and mounts inside the notes router, behind the owner guard. The public
//! router resolves share links by `public_id` and runs behind the optional
//! auth middleware so logged-out visitors can follow public links.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    guard::GuardState,
    middleware::{AuthExtractor, MaybeAuthExtractor},
    sharing::SharingManager,
};
use papyr_core::{EntityId, Note, NoteStatus, PublicUser, ShareType, Timestamp};

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for share routes.
#[derive(Clone)]
pub struct ShareState {
    pub sharing: SharingManager,
}

impl ShareState {
    pub fn new(sharing: SharingManager) -> Self {
        Self { sharing }
    }
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// Path capture for assignment removal: note id plus target user id.
#[derive(Debug, Deserialize)]
pub struct AssignmentPath {
    pub id: EntityId,
    pub user_id: EntityId,
}

/// Path capture for public link resolution.
#[derive(Debug, Deserialize)]
pub struct PublicLinkPath {
    pub public_id: EntityId,
}

#[derive(Debug, Deserialize)]
pub struct UpsertShareRequest {
    pub share_type: ShareType,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
    /// Emails to grant access to; only meaningful for private shares.
    #[serde(default)]
    pub emails: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareStatusResponse {
    pub is_shared: bool,
    pub public_id: EntityId,
    pub share_url: String,
    pub share_type: ShareType,
    pub expires_at: Option<Timestamp>,
    pub assigned_users: Vec<PublicUser>,
}

impl ShareStatusResponse {
    fn new(session: papyr_core::ShareSession, assigned_users: Vec<PublicUser>) -> Self {
        Self {
            is_shared: true,
            share_url: format!("/api/share/{}", session.public_id),
            public_id: session.public_id,
            share_type: session.share_type,
            expires_at: session.expires_at,
            assigned_users,
        }
    }
}

/// Body returned when a note has no share session; still a 200.
#[derive(Debug, Serialize)]
pub struct ShareAbsentResponse {
    pub is_shared: bool,
}

#[derive(Debug, Serialize)]
pub struct UpsertShareResponse {
    #[serde(flatten)]
    pub status: ShareStatusResponse,
    /// Emails with no matching account, reported so clients can surface them.
    pub skipped_emails: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SharedNoteResponse {
    pub title: String,
    pub content: String,
    pub owner_username: String,
    pub share_type: ShareType,
    pub updated_at: Timestamp,
}

// ============================================================================
// OWNER ROUTE HANDLERS
// ============================================================================

/// GET /api/notes/:id/share - Current sharing state (owner only)
///
/// An unshared note is not an error; the response carries an
/// `is_shared: false` sentinel instead.
pub async fn get_share_status(
    State(state): State<Arc<ShareState>>,
    Extension(note): Extension<Note>,
) -> ApiResult<axum::response::Response> {
    match state.sharing.share_status(note.id).await? {
        Some(status) => Ok(Json(ShareStatusResponse::new(
            status.session,
            status.assigned_users,
        ))
        .into_response()),
        None => Ok(Json(ShareAbsentResponse { is_shared: false }).into_response()),
    }
}

/// POST /api/notes/:id/share - Create or reconfigure the share session
/// (owner only)
///
/// Only active notes can be shared; archived and soft-deleted notes
/// must be restored first.
pub async fn upsert_share(
    State(state): State<Arc<ShareState>>,
    AuthExtractor(auth): AuthExtractor,
    Extension(note): Extension<Note>,
    Json(req): Json<UpsertShareRequest>,
) -> ApiResult<impl IntoResponse> {
    if note.status != NoteStatus::Active {
        return Err(ApiError::invalid_input("Only active notes can be shared"));
    }

    let outcome = state
        .sharing
        .upsert_share(
            note.id,
            &auth.email,
            req.share_type,
            req.expires_at,
            &req.emails,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UpsertShareResponse {
            status: ShareStatusResponse::new(outcome.session, outcome.assigned_users),
            skipped_emails: outcome.skipped_emails,
        }),
    ))
}

/// DELETE /api/notes/:id/share - Stop sharing the note (owner only)
pub async fn remove_share(
    State(state): State<Arc<ShareState>>,
    Extension(note): Extension<Note>,
) -> ApiResult<StatusCode> {
    state.sharing.remove_share(note.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/notes/:id/share/users/:user_id - Revoke one user's grant
/// (owner only)
pub async fn remove_assignment(
    State(state): State<Arc<ShareState>>,
    Path(path): Path<AssignmentPath>,
    Extension(note): Extension<Note>,
) -> ApiResult<StatusCode> {
    debug_assert_eq!(path.id, note.id);

    state
        .sharing
        .remove_assignment(note.id, path.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PUBLIC ROUTE HANDLERS
// ============================================================================

/// GET /api/share/:public_id - Resolve a share link
///
/// Anonymous callers resolve public shares; authenticated callers also
/// resolve private shares they are assigned to. All failures are 404.
pub async fn resolve_link(
    State(state): State<Arc<ShareState>>,
    MaybeAuthExtractor(auth): MaybeAuthExtractor,
    Path(path): Path<PublicLinkPath>,
) -> ApiResult<impl IntoResponse> {
    let caller = auth.map(|ctx| ctx.user_id);

    let view = state
        .sharing
        .resolve_public_link(path.public_id, caller)
        .await?;

    Ok(Json(SharedNoteResponse {
        title: view.title,
        content: view.content,
        owner_username: view.owner_username,
        share_type: view.share_type,
        updated_at: view.updated_at,
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the owner-facing share routes, for merging into the notes router.
///
/// Paths are distinct from the note routes so the merge cannot collide.
pub fn create_owner_router(sharing: SharingManager, guard_state: GuardState) -> axum::Router {
    use axum::middleware::from_fn_with_state;
    use axum::routing::{delete, get};

    let state = Arc::new(ShareState::new(sharing));

    axum::Router::new()
        .route(
            "/:id/share",
            get(get_share_status).post(upsert_share).delete(remove_share),
        )
        .route("/:id/share/users/:user_id", delete(remove_assignment))
        .route_layer(from_fn_with_state(
            guard_state,
            crate::guard::require_owner,
        ))
        .with_state(state)
}

/// Create the public share-link router.
///
/// Callers pass through `optional_auth_middleware`, applied by the caller
/// when mounting, so both anonymous and authenticated requests resolve.
pub fn create_public_router(sharing: SharingManager) -> axum::Router {
    use axum::routing::get;

    let state = Arc::new(ShareState::new(sharing));

    axum::Router::new()
        .route("/:public_id", get(resolve_link))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthContext;
    use crate::db::{DbClient, DbConfig};
    use crate::error::ErrorCode;
    use chrono::Utc;
    use papyr_core::{new_entity_id, NoteStatus};

    // The inactive-note rejection fires before any query runs, so a pool
    // pointing nowhere is fine.
    fn unreachable_state() -> Arc<ShareState> {
        let db = DbClient::from_config(&DbConfig::default()).expect("pool config is static");
        Arc::new(ShareState::new(SharingManager::new(db)))
    }

    fn note_with_status(status: NoteStatus) -> Note {
        let now = Utc::now();
        Note {
            id: new_entity_id(),
            user_id: new_entity_id(),
            title: "Groceries".to_string(),
            content: "milk, eggs".to_string(),
            status,
            created_at: now,
            updated_at: now,
            deleted_at: match status {
                NoteStatus::Deleted => Some(now),
                _ => None,
            },
        }
    }

    async fn upsert_for(status: NoteStatus) -> Option<ApiError> {
        let note = note_with_status(status);
        let auth = AuthContext::new(note.user_id, "owner@example.com".to_string());
        let req = UpsertShareRequest {
            share_type: ShareType::Public,
            expires_at: None,
            emails: Vec::new(),
        };

        upsert_share(
            State(unreachable_state()),
            AuthExtractor(auth),
            Extension(note),
            Json(req),
        )
        .await
        .err()
    }

    #[tokio::test]
    async fn test_sharing_a_deleted_note_is_rejected() {
        let err = upsert_for(NoteStatus::Deleted)
            .await
            .expect("sharing a deleted note must fail");
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_sharing_an_archived_note_is_rejected() {
        let err = upsert_for(NoteStatus::Archived)
            .await
            .expect("sharing an archived note must fail");
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_sharing_an_active_note_passes_the_status_check() {
        // The active path proceeds to the database; only the storage layer
        // may fail here, never the status validation.
        if let Some(err) = upsert_for(NoteStatus::Active).await {
            assert_ne!(err.code, ErrorCode::InvalidInput, "{}", err.message);
        }
    }
}
