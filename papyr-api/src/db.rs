//! Database Connection Pool Module
//!
//! This module provides PostgreSQL connection pooling using deadpool-postgres
//! and a typed client over the Papyr schema (users, refresh tokens, notes,
//! share sessions, share assignments).
//!
//! All row-to-entity mapping lives here; handlers and managers never touch
//! `tokio_postgres::Row` directly.

use crate::error::{ApiError, ApiResult};
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use papyr_core::{
    new_entity_id, EntityId, Note, NoteStatus, PublicUser, RefreshTokenRecord, ShareSession,
    ShareType, Timestamp, User,
};
use std::str::FromStr;
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "papyr".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PAPYR_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("PAPYR_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("PAPYR_DB_NAME").unwrap_or_else(|_| "papyr".to_string()),
            user: std::env::var("PAPYR_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("PAPYR_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("PAPYR_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("PAPYR_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_config.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// QUERY PARAMETER TYPES
// ============================================================================

/// Parameters for note listing.
#[derive(Debug, Clone)]
pub struct NoteListParams {
    /// 1-based page number.
    pub page: i64,
    /// Page size.
    pub limit: i64,
    /// Case-insensitive substring search over title and content.
    pub q: Option<String>,
    /// Status filter; defaults to active. `None` means all statuses.
    pub status: Option<NoteStatus>,
    /// Sort column, validated against a whitelist.
    pub sort_by: SortColumn,
    /// Sort direction.
    pub order: SortOrder,
}

impl Default for NoteListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            q: None,
            status: Some(NoteStatus::Active),
            sort_by: SortColumn::UpdatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// Whitelisted sort columns for note listing.
///
/// Sort input is interpolated into SQL, so it must come through this enum
/// rather than as a raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    CreatedAt,
    UpdatedAt,
    Title,
}

impl SortColumn {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
            SortColumn::Title => "title",
        }
    }
}

impl FromStr for SortColumn {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(SortColumn::CreatedAt),
            "updated_at" => Ok(SortColumn::UpdatedAt),
            "title" => Ok(SortColumn::Title),
            _ => Err(ApiError::invalid_input(format!(
                "Unsupported sort column '{}'",
                s
            ))),
        }
    }
}

/// Sort direction for note listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ApiError::invalid_input(format!(
                "Unsupported sort order '{}'",
                s
            ))),
        }
    }
}

/// Result of a share upsert: the session, who ended up assigned, and
/// which requested emails matched no account.
#[derive(Debug, Clone)]
pub struct ShareUpsertOutcome {
    pub session: ShareSession,
    pub assigned_users: Vec<PublicUser>,
    pub skipped_emails: Vec<String>,
}

/// A note joined with its owner's username, for shared-note listings.
#[derive(Debug, Clone)]
pub struct SharedNote {
    pub note: Note,
    pub owner_username: String,
}

// ============================================================================
// ROW MAPPERS
// ============================================================================

fn user_from_row(row: &Row) -> ApiResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        password_salt: row.try_get("password_salt")?,
        created_at: row.try_get("created_at")?,
    })
}

fn public_user_from_row(row: &Row) -> ApiResult<PublicUser> {
    Ok(PublicUser {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
    })
}

fn refresh_token_from_row(row: &Row) -> ApiResult<RefreshTokenRecord> {
    Ok(RefreshTokenRecord {
        user_id: row.try_get("user_id")?,
        token_hash: row.try_get("token_hash")?,
        device: row.try_get("device")?,
        created_at: row.try_get("created_at")?,
    })
}

fn note_from_row(row: &Row) -> ApiResult<Note> {
    let status: String = row.try_get("status")?;
    Ok(Note {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn share_session_from_row(row: &Row) -> ApiResult<ShareSession> {
    let share_type: String = row.try_get("share_type")?;
    Ok(ShareSession {
        id: row.try_get("id")?,
        note_id: row.try_get("note_id")?,
        public_id: row.try_get("public_id")?,
        share_type: share_type.parse()?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

const USER_COLUMNS: &str = "id, username, email, password_hash, password_salt, created_at";
const NOTE_COLUMNS: &str =
    "id, user_id, title, content, status, created_at, updated_at, deleted_at";
const SHARE_COLUMNS: &str = "id, note_id, public_id, share_type, expires_at, created_at";

/// Database client that wraps a connection pool and provides
/// typed operations over the Papyr schema.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Run a trivial query to verify database connectivity.
    pub async fn ping(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    // ========================================================================
    // USER OPERATIONS
    // ========================================================================

    /// Create a new user. A duplicate email or username surfaces as a
    /// conflict through the unique-violation mapping in `From<tokio_postgres::Error>`.
    pub async fn user_create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        password_salt: &str,
    ) -> ApiResult<User> {
        let conn = self.get_conn().await?;
        let id = new_entity_id();

        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO users (id, username, email, password_hash, password_salt) \
                     VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
                ),
                &[&id, &username, &email, &password_hash, &password_salt],
            )
            .await?;

        user_from_row(&row)
    }

    /// Get a user by email.
    pub async fn user_get_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"),
                &[&email],
            )
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Get a user by ID.
    pub async fn user_get_by_id(&self, id: EntityId) -> ApiResult<Option<User>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"),
                &[&id],
            )
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Replace a user's password hash and salt.
    pub async fn user_update_password(
        &self,
        id: EntityId,
        password_hash: &str,
        password_salt: &str,
    ) -> ApiResult<bool> {
        let conn = self.get_conn().await?;

        let updated = conn
            .execute(
                "UPDATE users SET password_hash = $2, password_salt = $3 WHERE id = $1",
                &[&id, &password_hash, &password_salt],
            )
            .await?;

        Ok(updated > 0)
    }

    /// Change a user's username.
    pub async fn user_update_username(&self, id: EntityId, username: &str) -> ApiResult<bool> {
        let conn = self.get_conn().await?;

        let updated = conn
            .execute(
                "UPDATE users SET username = $2 WHERE id = $1",
                &[&id, &username],
            )
            .await?;

        Ok(updated > 0)
    }

    // ========================================================================
    // REFRESH TOKEN OPERATIONS
    // ========================================================================

    /// Store a refresh token hash for a (user, device) pair.
    ///
    /// One lineage per device: logging in again on the same device replaces
    /// the stored hash instead of accumulating rows.
    pub async fn refresh_token_upsert(
        &self,
        user_id: EntityId,
        token_hash: &str,
        device: &str,
    ) -> ApiResult<()> {
        let conn = self.get_conn().await?;

        conn.execute(
            "INSERT INTO refresh_tokens (user_id, token_hash, device) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, device) \
             DO UPDATE SET token_hash = EXCLUDED.token_hash, created_at = now()",
            &[&user_id, &token_hash, &device],
        )
        .await?;

        Ok(())
    }

    /// Look up the stored refresh lineage for a (user, device) pair.
    pub async fn refresh_token_find(
        &self,
        user_id: EntityId,
        device: &str,
    ) -> ApiResult<Option<RefreshTokenRecord>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT user_id, token_hash, device, created_at FROM refresh_tokens \
                 WHERE user_id = $1 AND device = $2",
                &[&user_id, &device],
            )
            .await?;

        row.as_ref().map(refresh_token_from_row).transpose()
    }

    /// Delete one stored refresh token. Returns whether a row existed;
    /// deleting an already-absent token is not an error.
    pub async fn refresh_token_delete(
        &self,
        user_id: EntityId,
        token_hash: &str,
    ) -> ApiResult<bool> {
        let conn = self.get_conn().await?;

        let deleted = conn
            .execute(
                "DELETE FROM refresh_tokens WHERE user_id = $1 AND token_hash = $2",
                &[&user_id, &token_hash],
            )
            .await?;

        Ok(deleted > 0)
    }

    /// Delete all stored refresh tokens for a user, across every device.
    pub async fn refresh_tokens_delete_all(&self, user_id: EntityId) -> ApiResult<u64> {
        let conn = self.get_conn().await?;

        let deleted = conn
            .execute("DELETE FROM refresh_tokens WHERE user_id = $1", &[&user_id])
            .await?;

        Ok(deleted)
    }

    // ========================================================================
    // NOTE OPERATIONS
    // ========================================================================

    /// Create a new note owned by `user_id`.
    pub async fn note_create(
        &self,
        user_id: EntityId,
        title: &str,
        content: &str,
    ) -> ApiResult<Note> {
        let conn = self.get_conn().await?;
        let id = new_entity_id();

        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO notes (id, user_id, title, content) \
                     VALUES ($1, $2, $3, $4) RETURNING {NOTE_COLUMNS}"
                ),
                &[&id, &user_id, &title, &content],
            )
            .await?;

        note_from_row(&row)
    }

    /// Get a note by ID, regardless of owner or status.
    pub async fn note_get(&self, id: EntityId) -> ApiResult<Option<Note>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1"),
                &[&id],
            )
            .await?;

        row.as_ref().map(note_from_row).transpose()
    }

    /// List a user's notes with pagination, search, and sorting.
    ///
    /// Returns the page of notes plus the total match count so callers
    /// can report page counts.
    pub async fn note_list(
        &self,
        user_id: EntityId,
        params: &NoteListParams,
    ) -> ApiResult<(Vec<Note>, i64)> {
        let conn = self.get_conn().await?;

        let status = params.status.map(|s| s.as_str());
        let pattern = params.q.as_ref().map(|q| format!("%{}%", q));
        let offset = (params.page.max(1) - 1) * params.limit;

        let mut where_clause = "WHERE user_id = $1".to_string();
        let mut sql_params: Vec<&(dyn ToSql + Sync)> = vec![&user_id];

        if let Some(status) = &status {
            where_clause.push_str(&format!(" AND status = ${}", sql_params.len() + 1));
            sql_params.push(status);
        }

        if let Some(pattern) = &pattern {
            where_clause.push_str(&format!(
                " AND (title ILIKE ${idx} OR content ILIKE ${idx})",
                idx = sql_params.len() + 1
            ));
            sql_params.push(pattern);
        }

        let count_row = conn
            .query_one(
                &format!("SELECT COUNT(*) FROM notes {where_clause}"),
                &sql_params,
            )
            .await?;
        let total: i64 = count_row.get(0);

        // Sort column and order come from whitelisted enums, never from
        // raw request input.
        let limit_idx = sql_params.len() + 1;
        let offset_idx = sql_params.len() + 2;
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM notes {where_clause} \
             ORDER BY {} {} LIMIT ${} OFFSET ${}",
            params.sort_by.as_sql(),
            params.order.as_sql(),
            limit_idx,
            offset_idx,
        );
        sql_params.push(&params.limit);
        sql_params.push(&offset);

        let rows = conn.query(&query, &sql_params).await?;
        let notes = rows.iter().map(note_from_row).collect::<ApiResult<_>>()?;

        Ok((notes, total))
    }

    /// Update a note's title and/or content, bumping `updated_at`.
    pub async fn note_update(
        &self,
        id: EntityId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> ApiResult<Option<Note>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE notes SET \
                     title = COALESCE($2, title), \
                     content = COALESCE($3, content), \
                     updated_at = now() \
                     WHERE id = $1 RETURNING {NOTE_COLUMNS}"
                ),
                &[&id, &title, &content],
            )
            .await?;

        row.as_ref().map(note_from_row).transpose()
    }

    /// Move a note to a new status. Entering the deleted status stamps
    /// `deleted_at`; leaving it clears the stamp.
    pub async fn note_set_status(
        &self,
        id: EntityId,
        status: NoteStatus,
    ) -> ApiResult<Option<Note>> {
        let conn = self.get_conn().await?;

        let status_str = status.as_str();
        let row = conn
            .query_opt(
                &format!(
                    "UPDATE notes SET \
                     status = $2, \
                     deleted_at = CASE WHEN $2 = 'deleted' THEN now() ELSE NULL END, \
                     updated_at = now() \
                     WHERE id = $1 RETURNING {NOTE_COLUMNS}"
                ),
                &[&id, &status_str],
            )
            .await?;

        row.as_ref().map(note_from_row).transpose()
    }

    /// Permanently remove a note. Share sessions and assignments go with
    /// it via ON DELETE CASCADE.
    pub async fn note_delete_permanent(&self, id: EntityId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;

        let deleted = conn
            .execute("DELETE FROM notes WHERE id = $1", &[&id])
            .await?;

        Ok(deleted > 0)
    }

    /// List active notes privately shared with `user_id`, newest first,
    /// each joined with the owner's username. Expired sessions are
    /// filtered out at read time.
    pub async fn notes_shared_with(&self, user_id: EntityId) -> ApiResult<Vec<SharedNote>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT n.id, n.user_id, n.title, n.content, n.status, \
                        n.created_at, n.updated_at, n.deleted_at, \
                        u.username AS owner_username \
                 FROM share_assignments a \
                 JOIN note_share_sessions s ON s.id = a.share_session_id \
                 JOIN notes n ON n.id = s.note_id \
                 JOIN users u ON u.id = n.user_id \
                 WHERE a.user_id = $1 \
                   AND n.status = 'active' \
                   AND (s.expires_at IS NULL OR s.expires_at > now()) \
                 ORDER BY n.updated_at DESC",
                &[&user_id],
            )
            .await?;

        rows.iter()
            .map(|row| {
                Ok(SharedNote {
                    note: note_from_row(row)?,
                    owner_username: row.try_get("owner_username")?,
                })
            })
            .collect()
    }

    // ========================================================================
    // SHARE SESSION OPERATIONS
    // ========================================================================

    /// Get the share session attached to a note, if any.
    pub async fn share_get_by_note(&self, note_id: EntityId) -> ApiResult<Option<ShareSession>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                &format!("SELECT {SHARE_COLUMNS} FROM note_share_sessions WHERE note_id = $1"),
                &[&note_id],
            )
            .await?;

        row.as_ref().map(share_session_from_row).transpose()
    }

    /// List the users assigned to a share session.
    pub async fn share_assigned_users(
        &self,
        share_session_id: EntityId,
    ) -> ApiResult<Vec<PublicUser>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT u.id, u.username, u.email \
                 FROM share_assignments a \
                 JOIN users u ON u.id = a.user_id \
                 WHERE a.share_session_id = $1 \
                 ORDER BY u.username",
                &[&share_session_id],
            )
            .await?;

        rows.iter().map(public_user_from_row).collect()
    }

    /// List the user IDs assigned to a share session.
    pub async fn share_assigned_user_ids(
        &self,
        share_session_id: EntityId,
    ) -> ApiResult<Vec<EntityId>> {
        let conn = self.get_conn().await?;

        let rows = conn
            .query(
                "SELECT user_id FROM share_assignments WHERE share_session_id = $1",
                &[&share_session_id],
            )
            .await?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Create or update the share session for a note, in one transaction.
    ///
    /// The session is upserted preserving its `public_id` (existing links
    /// stay valid across re-shares), the assignment set is cleared, and
    /// the users behind `emails` are re-assigned. Emails with no matching
    /// account are reported back, not treated as errors.
    pub async fn share_upsert(
        &self,
        note_id: EntityId,
        share_type: ShareType,
        expires_at: Option<Timestamp>,
        emails: &[String],
    ) -> ApiResult<ShareUpsertOutcome> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        let id = new_entity_id();
        let public_id = new_entity_id();
        let share_type_str = share_type.as_str();

        let row = tx
            .query_one(
                &format!(
                    "INSERT INTO note_share_sessions (id, note_id, public_id, share_type, expires_at) \
                     VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (note_id) \
                     DO UPDATE SET share_type = EXCLUDED.share_type, \
                                   expires_at = EXCLUDED.expires_at \
                     RETURNING {SHARE_COLUMNS}"
                ),
                &[&id, &note_id, &public_id, &share_type_str, &expires_at],
            )
            .await?;
        let session = share_session_from_row(&row)?;

        // The assignment set is rewritten from scratch on every upsert, so
        // switching to public leaves no stale grants behind.
        tx.execute(
            "DELETE FROM share_assignments WHERE share_session_id = $1",
            &[&session.id],
        )
        .await?;

        let mut assigned_users = Vec::new();
        let mut skipped_emails = Vec::new();

        if share_type == ShareType::Private && !emails.is_empty() {
            let rows = tx
                .query(
                    "SELECT id, username, email FROM users WHERE email = ANY($1)",
                    &[&emails],
                )
                .await?;

            assigned_users = rows
                .iter()
                .map(public_user_from_row)
                .collect::<ApiResult<Vec<_>>>()?;

            for email in emails {
                if !assigned_users.iter().any(|u| &u.email == email) {
                    skipped_emails.push(email.clone());
                }
            }

            for user in &assigned_users {
                tx.execute(
                    "INSERT INTO share_assignments (share_session_id, user_id) \
                     VALUES ($1, $2) ON CONFLICT DO NOTHING",
                    &[&session.id, &user.id],
                )
                .await?;
            }
        } else {
            skipped_emails = emails.to_vec();
        }

        tx.commit().await?;

        Ok(ShareUpsertOutcome {
            session,
            assigned_users,
            skipped_emails,
        })
    }

    /// Look up a share session by its public ID, joined with the note and
    /// the owner's username.
    pub async fn share_get_by_public_id(
        &self,
        public_id: EntityId,
    ) -> ApiResult<Option<(ShareSession, Note, String)>> {
        let conn = self.get_conn().await?;

        let row = conn
            .query_opt(
                "SELECT s.id, s.note_id, s.public_id, s.share_type, s.expires_at, \
                        s.created_at, \
                        n.id AS n_id, n.user_id AS n_user_id, n.title, n.content, \
                        n.status, n.created_at AS n_created_at, \
                        n.updated_at AS n_updated_at, n.deleted_at, \
                        u.username AS owner_username \
                 FROM note_share_sessions s \
                 JOIN notes n ON n.id = s.note_id \
                 JOIN users u ON u.id = n.user_id \
                 WHERE s.public_id = $1",
                &[&public_id],
            )
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let share_type: String = row.try_get("share_type")?;
        let session = ShareSession {
            id: row.try_get("id")?,
            note_id: row.try_get("note_id")?,
            public_id: row.try_get("public_id")?,
            share_type: share_type.parse()?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
        };

        let status: String = row.try_get("status")?;
        let note = Note {
            id: row.try_get("n_id")?,
            user_id: row.try_get("n_user_id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            status: status.parse()?,
            created_at: row.try_get("n_created_at")?,
            updated_at: row.try_get("n_updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        };

        let owner_username: String = row.try_get("owner_username")?;

        Ok(Some((session, note, owner_username)))
    }

    /// Remove one user's assignment from a share session.
    pub async fn share_assignment_delete(
        &self,
        share_session_id: EntityId,
        user_id: EntityId,
    ) -> ApiResult<bool> {
        let conn = self.get_conn().await?;

        let deleted = conn
            .execute(
                "DELETE FROM share_assignments \
                 WHERE share_session_id = $1 AND user_id = $2",
                &[&share_session_id, &user_id],
            )
            .await?;

        Ok(deleted > 0)
    }

    /// Remove a note's share session entirely. Assignments go with it via
    /// ON DELETE CASCADE.
    pub async fn share_delete_by_note(&self, note_id: EntityId) -> ApiResult<bool> {
        let conn = self.get_conn().await?;

        let deleted = conn
            .execute(
                "DELETE FROM note_share_sessions WHERE note_id = $1",
                &[&note_id],
            )
            .await?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "papyr");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!("created_at".parse::<SortColumn>().ok(), Some(SortColumn::CreatedAt));
        assert_eq!("updated_at".parse::<SortColumn>().ok(), Some(SortColumn::UpdatedAt));
        assert_eq!("title".parse::<SortColumn>().ok(), Some(SortColumn::Title));

        // Anything outside the whitelist is rejected before reaching SQL.
        assert!("content; DROP TABLE notes".parse::<SortColumn>().is_err());
        assert!("user_id".parse::<SortColumn>().is_err());
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("asc".parse::<SortOrder>().ok(), Some(SortOrder::Asc));
        assert_eq!("DESC".parse::<SortOrder>().ok(), Some(SortOrder::Desc));
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_note_list_params_defaults() {
        let params = NoteListParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.status, Some(NoteStatus::Active));
        assert_eq!(params.sort_by, SortColumn::UpdatedAt);
        assert_eq!(params.order, SortOrder::Desc);
    }
}
