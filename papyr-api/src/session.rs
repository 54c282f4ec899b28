//! Session Manager
//!
//! Account and credential lifecycle: registration, login, access-token
//! refresh, logout, and credential changes. This layer owns the pairing
//! between issued JWTs and the server-side refresh-token store; handlers
//! in `routes::auth` stay thin over it.
//!
//! Refresh tokens are tracked per (user, device). Refreshing does not
//! rotate the stored lineage; the same refresh token keeps minting access
//! tokens until it expires or is revoked by logout or a password change.

use crate::auth::{
    decode_token, generate_token, validate_token, AuthConfig, TokenKind,
};
use crate::db::DbClient;
use crate::error::{ApiError, ApiResult};
use crate::password::{generate_salt, hash_password, hash_refresh_token, verify_password};
use crate::validation::{validate_email, validate_password, validate_username};
use papyr_core::{EntityId, PublicUser, RefreshTokenRecord};
use std::sync::Arc;

/// An access/refresh token pair as returned to clients.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful login or registration.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

/// Manager for account and session operations.
#[derive(Clone)]
pub struct SessionManager {
    db: DbClient,
    auth: Arc<AuthConfig>,
}

impl SessionManager {
    pub fn new(db: DbClient, auth: Arc<AuthConfig>) -> Self {
        Self { db, auth }
    }

    /// Register a new account and open its first session.
    ///
    /// A duplicate email or username surfaces as a 409 conflict from the
    /// unique constraints; there is no pre-check racing the insert.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        device: &str,
    ) -> ApiResult<SessionOutcome> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        let salt = generate_salt();
        let hash = hash_password(&self.auth.password_hash_secret, password, &salt)?;

        let user = self.db.user_create(username, email, &hash, &salt).await?;

        tracing::info!(user_id = %user.id, "Registered new user");

        let tokens = self.open_session(user.id, &user.email, device).await?;

        Ok(SessionOutcome {
            user: user.public(),
            tokens,
        })
    }

    /// Authenticate by email and password.
    ///
    /// Unknown email and wrong password take the same error path so the
    /// response never reveals whether an account exists.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        device: &str,
    ) -> ApiResult<SessionOutcome> {
        let Some(user) = self.db.user_get_by_email(email).await? else {
            return Err(ApiError::invalid_credentials());
        };

        let valid = verify_password(
            &self.auth.password_hash_secret,
            password,
            &user.password_salt,
            &user.password_hash,
        )?;
        if !valid {
            return Err(ApiError::invalid_credentials());
        }

        tracing::info!(user_id = %user.id, device = %device, "User logged in");

        let tokens = self.open_session(user.id, &user.email, device).await?;

        Ok(SessionOutcome {
            user: user.public(),
            tokens,
        })
    }

    /// Issue a token pair and store the refresh token's hash for the
    /// (user, device) lineage, replacing any previous one.
    async fn open_session(
        &self,
        user_id: EntityId,
        email: &str,
        device: &str,
    ) -> ApiResult<TokenPair> {
        let access_token =
            generate_token(&self.auth, TokenKind::Access, user_id, email.to_string())?;
        let refresh_token =
            generate_token(&self.auth, TokenKind::Refresh, user_id, email.to_string())?;

        let token_hash = hash_refresh_token(&self.auth.refresh_store_secret, &refresh_token)?;
        self.db
            .refresh_token_upsert(user_id, &token_hash, device)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Mint a new access token from a refresh token.
    ///
    /// The token must verify against the refresh secret, be unexpired, and
    /// match the stored lineage for this (user, device) pair. A revoked
    /// lineage (logout, password change), a token replaced by a newer
    /// login, or the right token under the wrong device label all fail
    /// here even if the JWT itself is still valid. Refresh failures are a
    /// 403, distinct from the 401 a missing access token produces.
    pub async fn refresh(&self, refresh_token: &str, device: &str) -> ApiResult<String> {
        let claims = validate_token(&self.auth, TokenKind::Refresh, refresh_token)
            .map_err(|err| ApiError::forbidden(err.message))?;
        let user_id = claims.user_id()?;

        let token_hash = hash_refresh_token(&self.auth.refresh_store_secret, refresh_token)?;
        let record = self.db.refresh_token_find(user_id, device).await?;
        verify_refresh_lineage(record.as_ref(), &token_hash)?;

        generate_token(&self.auth, TokenKind::Access, user_id, claims.email)
    }

    /// Close the session behind a refresh token.
    ///
    /// Idempotent: an unknown, already-revoked, or expired token is not an
    /// error. Only the presented device's lineage is removed; sessions on
    /// other devices stay live.
    pub async fn logout(&self, refresh_token: &str) -> ApiResult<()> {
        // Signature check only: an expired token must still be able to
        // delete its stored lineage.
        let Ok(claims) = decode_token(&self.auth, TokenKind::Refresh, refresh_token) else {
            return Ok(());
        };
        let Ok(user_id) = claims.user_id() else {
            return Ok(());
        };

        let token_hash = hash_refresh_token(&self.auth.refresh_store_secret, refresh_token)?;
        let removed = self.db.refresh_token_delete(user_id, &token_hash).await?;

        if removed {
            tracing::info!(user_id = %user_id, "User logged out");
        }

        Ok(())
    }

    /// Change the account password.
    ///
    /// Verifies the current password first, then re-salts and re-hashes.
    /// Every stored refresh token is revoked, logging the account out on
    /// all devices; the caller keeps working only until the current access
    /// token expires.
    pub async fn change_password(
        &self,
        user_id: EntityId,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        validate_password(new_password)?;

        let user = self
            .db
            .user_get_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let valid = verify_password(
            &self.auth.password_hash_secret,
            current_password,
            &user.password_salt,
            &user.password_hash,
        )?;
        if !valid {
            return Err(ApiError::invalid_credentials());
        }

        let salt = generate_salt();
        let hash = hash_password(&self.auth.password_hash_secret, new_password, &salt)?;
        self.db.user_update_password(user_id, &hash, &salt).await?;

        let revoked = self.db.refresh_tokens_delete_all(user_id).await?;
        tracing::info!(
            user_id = %user_id,
            revoked_sessions = revoked,
            "Password changed, all sessions revoked"
        );

        Ok(())
    }

    /// Change the account username.
    ///
    /// Re-verifies the caller's password: a live access token alone is not
    /// enough to rename the account.
    pub async fn change_username(
        &self,
        user_id: EntityId,
        new_username: &str,
        password: &str,
    ) -> ApiResult<PublicUser> {
        validate_username(new_username)?;

        let user = self
            .db
            .user_get_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let valid = verify_password(
            &self.auth.password_hash_secret,
            password,
            &user.password_salt,
            &user.password_hash,
        )?;
        if !valid {
            return Err(ApiError::invalid_credentials());
        }

        let updated = self.db.user_update_username(user_id, new_username).await?;
        if !updated {
            return Err(ApiError::not_found("User not found"));
        }

        self.db
            .user_get_by_id(user_id)
            .await?
            .map(|user| user.public())
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Look up the current account's public profile.
    pub async fn current_user(&self, user_id: EntityId) -> ApiResult<PublicUser> {
        self.db
            .user_get_by_id(user_id)
            .await?
            .map(|user| user.public())
            .ok_or_else(|| ApiError::not_found("User not found"))
    }
}

/// Match a presented refresh token's hash against the stored lineage for
/// the (user, device) pair it arrived under. No stored lineage and a
/// stale hash fail identically.
fn verify_refresh_lineage(
    record: Option<&RefreshTokenRecord>,
    presented_hash: &str,
) -> ApiResult<()> {
    match record {
        Some(record) if record.token_hash == presented_hash => Ok(()),
        _ => Err(ApiError::forbidden("Refresh token has been revoked")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConfig;
    use crate::error::ErrorCode;
    use axum::http::StatusCode;
    use chrono::Utc;
    use papyr_core::new_entity_id;

    fn stored_record(token_hash: &str, device: &str) -> RefreshTokenRecord {
        RefreshTokenRecord {
            user_id: new_entity_id(),
            token_hash: token_hash.to_string(),
            device: device.to_string(),
            created_at: Utc::now(),
        }
    }

    // These tests never reach the database; a pool pointing nowhere is
    // fine because the paths under test fail before any query runs.
    fn unreachable_manager() -> SessionManager {
        let db = DbClient::from_config(&DbConfig::default()).expect("pool config is static");
        SessionManager::new(db, Arc::new(AuthConfig::default()))
    }

    #[test]
    fn test_refresh_lineage_requires_stored_record() {
        let err = verify_refresh_lineage(None, "abc123").unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_refresh_lineage_rejects_stale_hash() {
        // A newer login on the same device replaced the stored hash.
        let record = stored_record("current-hash", "laptop");
        let err = verify_refresh_lineage(Some(&record), "previous-hash").unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_refresh_lineage_accepts_matching_hash() {
        let record = stored_record("current-hash", "laptop");
        assert!(verify_refresh_lineage(Some(&record), "current-hash").is_ok());
    }

    #[tokio::test]
    async fn test_refresh_with_invalid_token_is_forbidden() {
        let sessions = unreachable_manager();

        let err = sessions.refresh("not-a-jwt", "laptop").await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
