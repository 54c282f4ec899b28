//! Note Access Guards
//!
//! Route-level middleware enforcing note ownership and share-derived
//! access. Both guards fetch the note once, stash it in request
//! extensions, and let handlers pick it up via `Extension<Note>` instead
//! of re-querying.
//!
//! Status contract:
//! - missing note: 404
//! - note exists but caller lacks rights: 403

use crate::db::DbClient;
use crate::error::ApiError;
use crate::middleware::AuthMiddlewareError;
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use papyr_core::{evaluate_share_access, AccessDecision, EntityId, Note, ShareView};
use serde::Deserialize;

/// Shared state for note guards.
#[derive(Clone)]
pub struct GuardState {
    pub db: DbClient,
}

impl GuardState {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

/// Path capture for the leading `:id` segment.
///
/// Deserialized by field name, so routes with extra trailing parameters
/// (`/:id/share/users/:user_id`) still resolve the note id correctly.
#[derive(Debug, Deserialize)]
pub struct NotePath {
    pub id: EntityId,
}

/// Middleware requiring that the authenticated caller owns the note.
///
/// Must run after `auth_middleware`; the caller's identity comes from the
/// injected AuthContext.
pub async fn require_owner(
    State(state): State<GuardState>,
    Path(path): Path<NotePath>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth = request
        .extensions()
        .get::<crate::auth::AuthContext>()
        .cloned()
        .ok_or_else(|| {
            AuthMiddlewareError(ApiError::internal_error(
                "AuthContext not found in request extensions. \
                 Ensure auth_middleware runs before the owner guard.",
            ))
        })?;

    let note = state
        .db
        .note_get(path.id)
        .await
        .map_err(AuthMiddlewareError)?
        .ok_or_else(|| AuthMiddlewareError(ApiError::note_not_found()))?;

    if note.user_id != auth.user_id {
        return Err(AuthMiddlewareError(ApiError::forbidden(
            "Only the note owner may perform this action",
        )));
    }

    request.extensions_mut().insert(note);

    Ok(next.run(request).await)
}

/// Middleware requiring that the caller may read the note.
///
/// Runs after `auth_middleware` or `optional_auth_middleware`; an absent
/// AuthContext means an anonymous caller, who can only pass through a
/// public share.
pub async fn require_access(
    State(state): State<GuardState>,
    Path(path): Path<NotePath>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let caller = request
        .extensions()
        .get::<crate::auth::AuthContext>()
        .map(|auth| auth.user_id);

    let note = state
        .db
        .note_get(path.id)
        .await
        .map_err(AuthMiddlewareError)?
        .ok_or_else(|| AuthMiddlewareError(ApiError::note_not_found()))?;

    let decision = access_decision_for(&state.db, &note, caller).await?;
    if !decision.is_allowed() {
        return Err(AuthMiddlewareError(ApiError::forbidden(
            "You do not have access to this note",
        )));
    }

    request.extensions_mut().insert(note);

    Ok(next.run(request).await)
}

/// Load the note's sharing state and evaluate access for `caller`.
pub async fn access_decision_for(
    db: &DbClient,
    note: &Note,
    caller: Option<EntityId>,
) -> Result<AccessDecision, AuthMiddlewareError> {
    let share = db
        .share_get_by_note(note.id)
        .await
        .map_err(AuthMiddlewareError)?;

    let view = match &share {
        Some(session) => {
            let assigned_user_ids = db
                .share_assigned_user_ids(session.id)
                .await
                .map_err(AuthMiddlewareError)?;
            Some(ShareView {
                share_type: session.share_type,
                expires_at: session.expires_at,
                assigned_user_ids,
            })
        }
        None => None,
    };

    Ok(evaluate_share_access(
        note.user_id,
        view.as_ref(),
        caller,
        Utc::now(),
    ))
}
