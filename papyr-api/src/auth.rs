//! Authentication Module
//!
//! This module provides token-based authentication for the Papyr API.
//! It implements a two-token scheme:
//! 1. Short-lived access tokens (via Authorization: Bearer header)
//! 2. Long-lived refresh tokens (via an HttpOnly cookie), tracked
//!    server-side per (user, device) as keyed hashes
//!
//! Access and refresh tokens are signed with independent secrets, so a
//! leaked access-signing key cannot mint refresh tokens and vice versa.

use crate::error::{ApiError, ApiResult};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use papyr_core::EntityId;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// CLOCK ABSTRACTION (FOR DETERMINISTIC TESTS + CI ROBUSTNESS)
// ============================================================================

/// Clock abstraction for JWT time validation.
///
/// This allows us to inject time in tests and handle broken CI environments
/// where `SystemTime::now()` might return pre-epoch times (causing panics).
///
/// By owning time validation ourselves (instead of letting `jsonwebtoken` do it),
/// we avoid the `SystemTime::now().duration_since(UNIX_EPOCH).expect()` panic
/// path and make tests fully deterministic.
pub trait JwtClock: Send + Sync {
    /// Get current time as Unix epoch seconds.
    ///
    /// Returns negative values for pre-1970 times (which should be treated as errors
    /// in production but can be handled gracefully in tests).
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
///
/// Always returns the same timestamp, making tests reproducible and
/// immune to CI environment clock issues.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

/// Test clock helpers for common scenarios.
#[cfg(test)]
pub mod test_clocks {
    use super::FixedClock;

    /// 2024-01-01 00:00:00 UTC - always valid for tests
    pub fn valid() -> FixedClock {
        FixedClock(1704067200)
    }

    /// 2030-01-01 00:00:00 UTC - far future for expiry tests
    pub fn future() -> FixedClock {
        FixedClock(1893456000)
    }
}

// ============================================================================
// SIGNING SECRET (TYPE-SAFE)
// ============================================================================

/// Type-safe signing secret that prevents accidental logging.
///
/// This wraps the secret in a `secrecy::SecretString` to ensure it's never
/// accidentally logged or displayed.
#[derive(Clone)]
pub struct SigningSecret(SecretString);

impl SigningSecret {
    /// Create a new signing secret.
    ///
    /// Empty input falls back to the insecure default so the server can
    /// still boot in development; `validate_for_production` rejects it
    /// before a production server starts serving.
    pub fn new(secret: String) -> Self {
        let normalized = if secret.trim().is_empty() {
            INSECURE_DEFAULT_SECRET.to_string()
        } else {
            secret
        };
        Self(SecretString::new(normalized.into()))
    }

    /// Expose the secret value (use sparingly, only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Get the length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    /// Check if the secret is empty without exposing it.
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    /// Check if the secret is the insecure default.
    pub fn is_insecure_default(&self) -> bool {
        self.0.expose_secret() == INSECURE_DEFAULT_SECRET
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningSecret([REDACTED, {} chars])", self.len())
    }
}

const INSECURE_DEFAULT_SECRET: &str = "INSECURE_DEFAULT_SECRET_CHANGE_IN_PRODUCTION";

fn secret_from_env(var: &str) -> SigningSecret {
    SigningSecret::new(std::env::var(var).unwrap_or_default())
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Which of the two token families a JWT belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Authentication configuration.
///
/// Holds the four independent secrets the credential scheme uses:
/// one per token family for signing, one for hashing refresh tokens
/// at rest, and one for keying password hashes.
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret for signing and verifying access tokens
    pub access_secret: SigningSecret,

    /// Secret for signing and verifying refresh tokens
    pub refresh_secret: SigningSecret,

    /// Secret for hashing refresh tokens before storage
    pub refresh_store_secret: SigningSecret,

    /// Secret for keying password hashes
    pub password_hash_secret: SigningSecret,

    /// JWT algorithm (default: HS256)
    pub jwt_algorithm: Algorithm,

    /// Access token lifetime in seconds (default: 15 minutes)
    pub access_expiration_secs: i64,

    /// Refresh token lifetime in seconds (default: 7 days)
    pub refresh_expiration_secs: i64,

    /// JWT clock skew tolerance in seconds (default: 60)
    ///
    /// Allows tokens to be slightly in the future/past to handle clock drift
    /// in distributed systems.
    pub jwt_clock_skew_secs: i64,

    /// Clock for JWT time validation (injected for testing)
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &self.access_secret)
            .field("refresh_secret", &self.refresh_secret)
            .field("refresh_store_secret", &self.refresh_store_secret)
            .field("password_hash_secret", &self.password_hash_secret)
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("access_expiration_secs", &self.access_expiration_secs)
            .field("refresh_expiration_secs", &self.refresh_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: secret_from_env("PAPYR_ACCESS_TOKEN_SECRET"),
            refresh_secret: secret_from_env("PAPYR_REFRESH_TOKEN_SECRET"),
            refresh_store_secret: secret_from_env("PAPYR_REFRESH_TOKEN_STORE_SECRET"),
            password_hash_secret: secret_from_env("PAPYR_HASH_SECRET_KEY"),
            jwt_algorithm: Algorithm::HS256,
            access_expiration_secs: 15 * 60,
            refresh_expiration_secs: 7 * 24 * 60 * 60,
            jwt_clock_skew_secs: 60,
            clock: Arc::new(SystemClock),
        }
    }
}

impl AuthConfig {
    /// Create authentication configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `PAPYR_ACCESS_TOKEN_SECRET`: access token signing secret
    /// - `PAPYR_REFRESH_TOKEN_SECRET`: refresh token signing secret
    /// - `PAPYR_REFRESH_TOKEN_STORE_SECRET`: refresh token at-rest hashing secret
    /// - `PAPYR_HASH_SECRET_KEY`: password hashing secret
    /// - `PAPYR_ACCESS_EXPIRATION_SECS`: access token lifetime (default: 900)
    /// - `PAPYR_REFRESH_EXPIRATION_SECS`: refresh token lifetime (default: 604800)
    /// - `PAPYR_JWT_CLOCK_SKEW_SECS`: clock skew tolerance (default: 60)
    pub fn from_env() -> Self {
        Self {
            access_expiration_secs: std::env::var("PAPYR_ACCESS_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15 * 60),
            refresh_expiration_secs: std::env::var("PAPYR_REFRESH_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7 * 24 * 60 * 60),
            jwt_clock_skew_secs: std::env::var("PAPYR_JWT_CLOCK_SKEW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            ..Default::default()
        }
    }

    fn secret_for(&self, kind: TokenKind) -> &SigningSecret {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn expiration_for(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_expiration_secs,
            TokenKind::Refresh => self.refresh_expiration_secs,
        }
    }

    /// Validate the authentication configuration for production use.
    ///
    /// This function should be called at server startup to ensure that
    /// insecure defaults are not being used in production environments.
    /// In development mode, warnings are logged but the server continues.
    pub fn validate_for_production(&self) -> ApiResult<()> {
        let environment = std::env::var("PAPYR_ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();

        let is_production = environment == "production" || environment == "prod";

        let secrets: [(&str, &SigningSecret); 4] = [
            ("PAPYR_ACCESS_TOKEN_SECRET", &self.access_secret),
            ("PAPYR_REFRESH_TOKEN_SECRET", &self.refresh_secret),
            ("PAPYR_REFRESH_TOKEN_STORE_SECRET", &self.refresh_store_secret),
            ("PAPYR_HASH_SECRET_KEY", &self.password_hash_secret),
        ];

        for (var, secret) in secrets {
            if secret.is_insecure_default() {
                if is_production {
                    return Err(ApiError::invalid_input(format!(
                        "Cannot start server in production with insecure default secret. \
                         Set {} to a secure value. PAPYR_ENVIRONMENT={}",
                        var, environment
                    )));
                }
                tracing::warn!(
                    "SECURITY WARNING: {} is using the insecure default. \
                     This is acceptable for local development but MUST be changed \
                     before deploying. Set it to a secure random value \
                     (minimum 32 characters).",
                    var
                );
                continue;
            }

            if secret.len() < 32 {
                if is_production {
                    return Err(ApiError::invalid_input(format!(
                        "{} is too short for production use ({} chars). \
                         It must be at least 32 characters long.",
                        var,
                        secret.len()
                    )));
                }
                tracing::warn!(
                    "SECURITY WARNING: {} is short ({} chars). \
                     For production, use at least 32 characters.",
                    var,
                    secret.len()
                );
            }
        }

        Ok(())
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// JWT claims structure.
///
/// Both token families carry the same claim set; they differ only in
/// signing secret and lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// User's email address
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims for a user using a clock.
    pub fn new(
        user_id: EntityId,
        email: String,
        expiration_secs: i64,
        clock: &dyn JwtClock,
    ) -> Self {
        let now = clock.now_epoch_secs();

        Self {
            sub: user_id.to_string(),
            email,
            iat: now,
            exp: now + expiration_secs,
        }
    }

    /// Check if the token has expired according to a clock.
    pub fn is_expired(&self, clock: &dyn JwtClock) -> bool {
        let now = clock.now_epoch_secs();
        self.exp < now
    }

    /// Get the subject as an EntityId.
    pub fn user_id(&self) -> ApiResult<EntityId> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| ApiError::invalid_token("Token subject is not a valid user id"))
    }
}

// ============================================================================
// AUTHENTICATION CONTEXT
// ============================================================================

/// Authentication context extracted from request.
///
/// This is injected into Axum request extensions after successful authentication.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// User ID (from JWT sub claim)
    pub user_id: EntityId,

    /// User's email address (from JWT email claim)
    pub email: String,
}

impl AuthContext {
    /// Create a new authentication context.
    pub fn new(user_id: EntityId, email: String) -> Self {
        Self { user_id, email }
    }
}

// ============================================================================
// TOKEN OPERATIONS
// ============================================================================

/// Validate JWT claim times using our own clock logic.
///
/// This is separated from signature validation so we can:
/// 1. Handle broken CI environments (pre-epoch clocks) gracefully
/// 2. Make tests fully deterministic with injected clocks
/// 3. Apply custom clock skew policies
fn validate_claim_times(now: i64, exp: i64, leeway_secs: i64) -> ApiResult<()> {
    // Check expiration (exp): allow slightly-in-the-past within leeway
    if exp < now - leeway_secs {
        return Err(ApiError::token_expired());
    }

    Ok(())
}

/// Decode a token of the given kind, checking the signature but not the
/// claim times.
///
/// Most callers want `validate_token`; this exists for logout, where an
/// expired refresh token must still identify the stored lineage to delete.
pub fn decode_token(config: &AuthConfig, kind: TokenKind, token: &str) -> ApiResult<Claims> {
    let decoding_key = DecodingKey::from_secret(config.secret_for(kind).expose().as_bytes());

    // Decode with signature validation ONLY (skip exp validation)
    let mut validation = Validation::new(config.jwt_algorithm);
    validation.validate_exp = false; // We'll do this ourselves with our clock
    validation.validate_nbf = false;
    // Keep required_spec_claims with "exp" to ensure it's present
    validation.required_spec_claims = std::collections::HashSet::from(["exp".to_string()]);

    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidToken => {
                ApiError::invalid_token("Token is invalid")
            }
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                ApiError::invalid_token("Token signature is invalid")
            }
            _ => ApiError::invalid_token(format!("Token validation failed: {}", e)),
        })?;

    Ok(token_data.claims)
}

/// Validate a token of the given kind and extract claims.
///
/// Signature validation happens in `decode_token` with `jsonwebtoken`'s
/// time checks disabled, avoiding the
/// `SystemTime::now().duration_since(UNIX_EPOCH).expect()` panic path.
/// We do our own time validation with injected clocks.
///
/// A token signed with the wrong family's secret fails signature
/// validation, so an access token can never stand in for a refresh token.
pub fn validate_token(config: &AuthConfig, kind: TokenKind, token: &str) -> ApiResult<Claims> {
    let claims = decode_token(config, kind, token)?;

    let now = config.clock.now_epoch_secs();

    // Fail loud if production clock returns pre-epoch time
    if now < 0 {
        tracing::error!(
            timestamp = now,
            "System clock returned pre-epoch time - server time is broken"
        );
        return Err(ApiError::internal_error(
            "Server time configuration error - please contact support",
        ));
    }

    validate_claim_times(now, claims.exp, config.jwt_clock_skew_secs)?;

    Ok(claims)
}

/// Generate a token of the given kind for a user.
///
/// Returns the encoded token string.
pub fn generate_token(
    config: &AuthConfig,
    kind: TokenKind,
    user_id: EntityId,
    email: String,
) -> ApiResult<String> {
    let claims = Claims::new(user_id, email, config.expiration_for(kind), &*config.clock);

    let encoding_key = EncodingKey::from_secret(config.secret_for(kind).expose().as_bytes());
    let header = Header::new(config.jwt_algorithm);

    encode(&header, &claims, &encoding_key)
        .map_err(|e| ApiError::internal_error(format!("Failed to generate token: {}", e)))
}

/// Authenticate a request using the Authorization header.
///
/// Extracts the Bearer token, validates it as an access token, and builds
/// the request's authentication context.
pub fn authenticate(config: &AuthConfig, auth_header: Option<&str>) -> ApiResult<AuthContext> {
    let Some(auth_value) = auth_header else {
        return Err(ApiError::unauthorized(
            "Authentication required: provide Authorization header",
        ));
    };

    let Some(token) = auth_value.strip_prefix("Bearer ") else {
        return Err(ApiError::invalid_token(
            "Authorization header must use Bearer scheme",
        ));
    };

    let claims = validate_token(config, TokenKind::Access, token)?;

    Ok(AuthContext::new(claims.user_id()?, claims.email))
}

// ============================================================================
// TESTS
// ============================================================================
