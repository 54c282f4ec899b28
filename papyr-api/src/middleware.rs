//! Axum Middleware for Authentication
//!
//! This module provides Axum middleware that:
//! - Authenticates requests using Bearer access tokens
//! - Injects AuthContext into request extensions
//! - Returns 401 for unauthenticated requests
//!
//! Two variants exist: `auth_middleware` rejects anonymous requests, and
//! `optional_auth_middleware` lets them through without an AuthContext so
//! public share links work for logged-out visitors.

use crate::auth::{authenticate, AuthConfig, AuthContext};
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware.
///
/// This is passed to the middleware via Axum's State extractor.
#[derive(Debug, Clone)]
pub struct AuthMiddlewareState {
    /// Authentication configuration
    pub auth_config: Arc<AuthConfig>,
}

impl AuthMiddlewareState {
    /// Create new middleware state with the given auth configuration.
    pub fn new(auth_config: AuthConfig) -> Self {
        Self {
            auth_config: Arc::new(auth_config),
        }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTIONS
// ============================================================================

/// Axum middleware for required authentication.
///
/// This middleware:
/// 1. Extracts the Authorization: Bearer header
/// 2. Validates it as an access token
/// 3. Returns 401 Unauthorized if authentication fails
/// 4. Injects AuthContext into request extensions on success
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use papyr_api::middleware::{auth_middleware, AuthMiddlewareState};
/// use papyr_api::AuthConfig;
///
/// let auth_state = AuthMiddlewareState::new(AuthConfig::from_env());
///
/// let app = Router::new()
///     .route("/api/notes", axum::routing::get(|| async { "OK" }))
///     .layer(middleware::from_fn_with_state(auth_state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    let auth_context =
        authenticate(&state.auth_config, auth_header).map_err(AuthMiddlewareError)?;

    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

/// Axum middleware for optional authentication.
///
/// Anonymous requests pass through with no AuthContext. A request that
/// does present an Authorization header must present a valid one; a bad
/// token is rejected rather than silently downgraded to anonymous.
pub async fn optional_auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    if auth_header.is_some() {
        let auth_context =
            authenticate(&state.auth_config, auth_header).map_err(AuthMiddlewareError)?;
        request.extensions_mut().insert(auth_context);
    }

    Ok(next.run(request).await)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse.
///
/// This allows the middleware to return errors that are automatically
/// converted to HTTP responses with appropriate status codes.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTORS
// ============================================================================

/// Typed Axum extractor for authentication context.
///
/// This extractor implements `FromRequestParts`, allowing it to be used
/// directly in route handler signatures. It provides compile-time guarantees
/// that authentication has been performed and makes auth required by the type system.
///
/// # Example
///
/// ```ignore
/// async fn whoami(AuthExtractor(auth): AuthExtractor) -> String {
///     auth.email
/// }
/// ```
///
/// # Requirements
///
/// The `auth_middleware` must be applied to the route or router for this
/// extractor to work. If the middleware is not present, the extractor will
/// return a 500 Internal Server Error.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Typed Axum extractor for routes behind `optional_auth_middleware`.
///
/// Yields `Some(AuthContext)` for authenticated callers and `None` for
/// anonymous ones; never rejects.
#[derive(Debug, Clone)]
pub struct MaybeAuthExtractor(pub Option<AuthContext>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthExtractor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthExtractor(
            parts.extensions.get::<AuthContext>().cloned(),
        ))
    }
}

// ============================================================================
// DEVICE LABEL
// ============================================================================

/// Extract the caller's device label from the X-Device header.
///
/// The label scopes refresh-token lineages, so two browsers on the same
/// account get independent sessions. Clients that send nothing all share
/// the "unknown" lineage.
pub fn extract_device_label(headers: &HeaderMap) -> String {
    headers
        .get("x-device")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

// ============================================================================
// TESTS
// ============================================================================
