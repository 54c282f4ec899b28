//! Note REST API Routes
//!
//! This module implements Axum route handlers for note CRUD, listing, and
//! status transitions. Ownership and access enforcement happen in the
//! guard middleware; handlers on guarded routes receive the already
//! fetched note through `Extension<Note>`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    db::{DbClient, NoteListParams, SortColumn, SortOrder},
    error::{ApiError, ApiResult},
    guard::GuardState,
    middleware::AuthExtractor,
    validation::{HasUpdates, ValidateNonEmpty},
};
use papyr_core::{Note, NoteStatus};

const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for note routes.
#[derive(Clone)]
pub struct NoteState {
    pub db: DbClient,
}

impl NoteState {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl HasUpdates for UpdateNoteRequest {
    fn has_any_updates(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: NoteStatus,
}

/// Raw query parameters for note listing; parsed into `NoteListParams`.
#[derive(Debug, Default, Deserialize)]
pub struct ListNotesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub q: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListNotesQuery {
    fn into_params(self) -> ApiResult<NoteListParams> {
        let defaults = NoteListParams::default();

        let page = self.page.unwrap_or(defaults.page);
        if page < 1 {
            return Err(ApiError::invalid_input("page must be at least 1"));
        }

        let limit = self.limit.unwrap_or(defaults.limit);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ApiError::invalid_input(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let status = match self.status.as_deref() {
            Some("all") => None,
            Some(s) => Some(
                s.parse::<NoteStatus>()
                    .map_err(|_| ApiError::invalid_input(format!("Unknown status '{}'", s)))?,
            ),
            None => defaults.status,
        };

        let sort_by = match self.sort_by.as_deref() {
            Some(s) => s.parse::<SortColumn>()?,
            None => defaults.sort_by,
        };

        let order = match self.order.as_deref() {
            Some(s) => s.parse::<SortOrder>()?,
            None => defaults.order,
        };

        Ok(NoteListParams {
            page,
            limit,
            q: self.q.filter(|q| !q.trim().is_empty()),
            status,
            sort_by,
            order,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl Pagination {
    fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            page,
            limit,
            // Ceiling division; an empty result set still reports one page.
            total_pages: ((total + limit - 1) / limit).max(1),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListNotesResponse {
    pub notes: Vec<Note>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct DeletedNoteResponse {
    pub message: &'static str,
    pub note: Note,
}

#[derive(Debug, Serialize)]
pub struct SharedNoteResponse {
    #[serde(flatten)]
    pub note: Note,
    pub owner_username: String,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/notes - Create a new note
pub async fn create_note(
    State(state): State<Arc<NoteState>>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<impl IntoResponse> {
    req.title.validate_non_empty("title")?;
    req.content.validate_non_empty("content")?;

    let note = state
        .db
        .note_create(auth.user_id, &req.title, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/notes - List the caller's notes with pagination and search
pub async fn list_notes(
    State(state): State<Arc<NoteState>>,
    AuthExtractor(auth): AuthExtractor,
    Query(query): Query<ListNotesQuery>,
) -> ApiResult<impl IntoResponse> {
    let params = query.into_params()?;
    let (notes, total) = state.db.note_list(auth.user_id, &params).await?;

    Ok(Json(ListNotesResponse {
        notes,
        pagination: Pagination::new(total, params.page, params.limit),
    }))
}

/// GET /api/notes/shared - List active notes privately shared with the caller
pub async fn list_shared_notes(
    State(state): State<Arc<NoteState>>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    let shared = state.db.notes_shared_with(auth.user_id).await?;

    let notes: Vec<SharedNoteResponse> = shared
        .into_iter()
        .map(|s| SharedNoteResponse {
            note: s.note,
            owner_username: s.owner_username,
        })
        .collect();

    Ok(Json(notes))
}

/// GET /api/notes/:id - Get a note the caller may read
///
/// Behind the access guard: owners, assigned users of a private share,
/// and anyone on a public share.
pub async fn get_note(Extension(note): Extension<Note>) -> ApiResult<impl IntoResponse> {
    Ok(Json(note))
}

/// PUT /api/notes/:id - Update title and/or content (owner only)
pub async fn update_note(
    State(state): State<Arc<NoteState>>,
    Extension(note): Extension<Note>,
    Json(req): Json<UpdateNoteRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate_has_updates()?;

    if let Some(ref title) = req.title {
        title.validate_non_empty("title")?;
    }
    if let Some(ref content) = req.content {
        content.validate_non_empty("content")?;
    }

    let updated = state
        .db
        .note_update(note.id, req.title.as_deref(), req.content.as_deref())
        .await?
        .ok_or_else(ApiError::note_not_found)?;

    Ok(Json(updated))
}

/// PATCH /api/notes/:id/status - Move a note between statuses (owner only)
pub async fn set_note_status(
    State(state): State<Arc<NoteState>>,
    Extension(note): Extension<Note>,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let updated = state
        .db
        .note_set_status(note.id, req.status)
        .await?
        .ok_or_else(ApiError::note_not_found)?;

    Ok(Json(updated))
}

/// DELETE /api/notes/:id - Soft-delete a note (owner only)
///
/// Moves the note to the deleted status; the row and its share session
/// survive until a permanent delete.
pub async fn delete_note(
    State(state): State<Arc<NoteState>>,
    Extension(note): Extension<Note>,
) -> ApiResult<impl IntoResponse> {
    let deleted = state
        .db
        .note_set_status(note.id, NoteStatus::Deleted)
        .await?
        .ok_or_else(ApiError::note_not_found)?;

    Ok(Json(deleted))
}

/// DELETE /api/notes/:id/permanent - Permanently delete a note (owner only)
pub async fn delete_note_permanent(
    State(state): State<Arc<NoteState>>,
    Extension(note): Extension<Note>,
) -> ApiResult<impl IntoResponse> {
    if !state.db.note_delete_permanent(note.id).await? {
        return Err(ApiError::note_not_found());
    }

    Ok(Json(DeletedNoteResponse {
        message: "Note permanently deleted",
        note,
    }))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the note routes router.
///
/// `/:id` mixes guards per method: reads go through the access guard,
/// mutations through the owner guard.
pub fn create_router(db: DbClient, guard_state: GuardState) -> axum::Router {
    use axum::middleware::from_fn_with_state;
    use axum::routing::{delete, get, patch, post, put};

    let state = Arc::new(NoteState::new(db));

    let read_by_id = get(get_note).route_layer(from_fn_with_state(
        guard_state.clone(),
        crate::guard::require_access,
    ));
    let mutate_by_id = put(update_note)
        .delete(delete_note)
        .route_layer(from_fn_with_state(
            guard_state.clone(),
            crate::guard::require_owner,
        ));

    let owner_only = from_fn_with_state(guard_state, crate::guard::require_owner);

    axum::Router::new()
        .route("/", post(create_note).get(list_notes))
        .route("/shared", get(list_shared_notes))
        .route("/:id", read_by_id.merge(mutate_by_id))
        .route(
            "/:id/status",
            patch(set_note_status).route_layer(owner_only.clone()),
        )
        .route(
            "/:id/permanent",
            delete(delete_note_permanent).route_layer(owner_only),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() -> ApiResult<()> {
        let params = ListNotesQuery::default().into_params()?;

        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.status, Some(NoteStatus::Active));
        assert!(params.q.is_none());
        Ok(())
    }

    #[test]
    fn test_list_query_status_all() -> ApiResult<()> {
        let query = ListNotesQuery {
            status: Some("all".to_string()),
            ..Default::default()
        };
        let params = query.into_params()?;
        assert_eq!(params.status, None);
        Ok(())
    }

    #[test]
    fn test_pagination_total_pages() {
        assert_eq!(Pagination::new(0, 1, 10).total_pages, 1);
        assert_eq!(Pagination::new(10, 1, 10).total_pages, 1);
        assert_eq!(Pagination::new(11, 1, 10).total_pages, 2);
        assert_eq!(Pagination::new(25, 2, 10).total_pages, 3);
    }

    #[test]
    fn test_list_query_bounds() {
        let query = ListNotesQuery {
            page: Some(0),
            ..Default::default()
        };
        assert!(query.into_params().is_err());

        let query = ListNotesQuery {
            limit: Some(MAX_PAGE_SIZE + 1),
            ..Default::default()
        };
        assert!(query.into_params().is_err());

        let query = ListNotesQuery {
            limit: Some(MAX_PAGE_SIZE),
            ..Default::default()
        };
        assert!(query.into_params().is_ok());
    }

    #[test]
    fn test_list_query_rejects_unknown_enums() {
        let query = ListNotesQuery {
            status: Some("everything".to_string()),
            ..Default::default()
        };
        assert!(query.into_params().is_err());

        let query = ListNotesQuery {
            sort_by: Some("owner".to_string()),
            ..Default::default()
        };
        assert!(query.into_params().is_err());

        let query = ListNotesQuery {
            order: Some("random".to_string()),
            ..Default::default()
        };
        assert!(query.into_params().is_err());
    }

    #[test]
    fn test_blank_search_treated_as_absent() -> ApiResult<()> {
        let query = ListNotesQuery {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        let params = query.into_params()?;
        assert!(params.q.is_none());
        Ok(())
    }

    #[test]
    fn test_update_request_has_updates() {
        let empty = UpdateNoteRequest {
            title: None,
            content: None,
        };
        assert!(empty.validate_has_updates().is_err());

        let with_title = UpdateNoteRequest {
            title: Some("New title".to_string()),
            content: None,
        };
        assert!(with_title.validate_has_updates().is_ok());
    }
}
