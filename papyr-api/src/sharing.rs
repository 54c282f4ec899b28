//! Sharing Manager
//!
//! Share-session lifecycle for notes: configuring a share, reading its
//! status, resolving public share links, and revoking grants. Ownership
//! checks happen in the route guards before these methods run; the one
//! exception is `resolve_public_link`, which does its own access
//! evaluation because it is reachable anonymously.

use crate::db::{DbClient, ShareUpsertOutcome};
use crate::error::{ApiError, ApiResult};
use chrono::Utc;
use papyr_core::{
    evaluate_share_access, EntityId, NoteStatus, PublicUser, ShareSession, ShareType, ShareView,
    Timestamp,
};

/// Current sharing state of a note, as reported to its owner.
#[derive(Debug, Clone)]
pub struct ShareStatus {
    pub session: ShareSession,
    pub assigned_users: Vec<PublicUser>,
}

/// A note as seen through its public share link.
///
/// Carries only reader-safe fields; owner id and note status stay
/// internal.
#[derive(Debug, Clone)]
pub struct SharedNoteView {
    pub title: String,
    pub content: String,
    pub owner_username: String,
    pub share_type: ShareType,
    pub updated_at: Timestamp,
}

/// Manager for note sharing operations.
#[derive(Clone)]
pub struct SharingManager {
    db: DbClient,
}

impl SharingManager {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }

    /// Get the sharing state of a note, if it is shared at all.
    pub async fn share_status(&self, note_id: EntityId) -> ApiResult<Option<ShareStatus>> {
        let Some(session) = self.db.share_get_by_note(note_id).await? else {
            return Ok(None);
        };

        let assigned_users = self.db.share_assigned_users(session.id).await?;

        Ok(Some(ShareStatus {
            session,
            assigned_users,
        }))
    }

    /// Create or reconfigure a note's share session.
    ///
    /// The assignment set is rewritten from the given emails on every
    /// call; a private share with no emails is valid and yields an
    /// owner-only session with every previous grant cleared. The owner's
    /// own email is dropped silently (owners always have access), and
    /// emails with no account come back in `skipped_emails` for the
    /// client to surface.
    pub async fn upsert_share(
        &self,
        note_id: EntityId,
        owner_email: &str,
        share_type: ShareType,
        expires_at: Option<Timestamp>,
        emails: &[String],
    ) -> ApiResult<ShareUpsertOutcome> {
        if let Some(expires) = expires_at {
            if expires <= Utc::now() {
                return Err(ApiError::invalid_input(
                    "Share expiry must be in the future",
                ));
            }
        }

        let emails = normalize_emails(emails, owner_email);

        let outcome = self
            .db
            .share_upsert(note_id, share_type, expires_at, &emails)
            .await?;

        tracing::info!(
            note_id = %note_id,
            share_type = %share_type,
            assigned = outcome.assigned_users.len(),
            skipped = outcome.skipped_emails.len(),
            "Share session updated"
        );

        Ok(outcome)
    }

    /// Resolve a public share link for `caller` (None for anonymous).
    ///
    /// Every failure mode is a 404: unknown link, expired session,
    /// inactive note, and denied private access all look identical, so
    /// the endpoint confirms nothing about links the caller cannot read.
    pub async fn resolve_public_link(
        &self,
        public_id: EntityId,
        caller: Option<EntityId>,
    ) -> ApiResult<SharedNoteView> {
        let Some((session, note, owner_username)) =
            self.db.share_get_by_public_id(public_id).await?
        else {
            return Err(ApiError::share_not_found());
        };

        if note.status != NoteStatus::Active {
            return Err(ApiError::share_not_found());
        }

        let assigned_user_ids = self.db.share_assigned_user_ids(session.id).await?;
        let view = ShareView {
            share_type: session.share_type,
            expires_at: session.expires_at,
            assigned_user_ids,
        };

        let decision = evaluate_share_access(note.user_id, Some(&view), caller, Utc::now());
        if !decision.is_allowed() {
            return Err(ApiError::share_not_found());
        }

        Ok(SharedNoteView {
            title: note.title,
            content: note.content,
            owner_username,
            share_type: session.share_type,
            updated_at: note.updated_at,
        })
    }

    /// Remove one user's grant from a note's share session.
    ///
    /// Only private sessions carry per-user grants; asking to remove a
    /// user from a public share is a caller error, not a missing
    /// assignment.
    pub async fn remove_assignment(
        &self,
        note_id: EntityId,
        target_user_id: EntityId,
    ) -> ApiResult<()> {
        let Some(session) = self.db.share_get_by_note(note_id).await? else {
            return Err(ApiError::share_not_found());
        };

        ensure_private_session(&session)?;

        let removed = self
            .db
            .share_assignment_delete(session.id, target_user_id)
            .await?;
        if !removed {
            return Err(ApiError::assignment_not_found());
        }

        Ok(())
    }

    /// Stop sharing a note entirely, dropping the session and all grants.
    pub async fn remove_share(&self, note_id: EntityId) -> ApiResult<()> {
        let removed = self.db.share_delete_by_note(note_id).await?;
        if !removed {
            return Err(ApiError::share_not_found());
        }

        tracing::info!(note_id = %note_id, "Share session removed");

        Ok(())
    }
}

/// Assignment edits apply to private sessions only.
fn ensure_private_session(session: &ShareSession) -> ApiResult<()> {
    if session.share_type != ShareType::Private {
        return Err(ApiError::invalid_input(
            "Cannot remove users from a public share",
        ));
    }
    Ok(())
}

/// Lowercase, trim, dedupe, and drop the owner's own address.
fn normalize_emails(emails: &[String], owner_email: &str) -> Vec<String> {
    let owner = owner_email.trim().to_lowercase();
    let mut out: Vec<String> = Vec::new();

    for email in emails {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() || normalized == owner {
            continue;
        }
        if !out.contains(&normalized) {
            out.push(normalized);
        }
    }

    out
}
