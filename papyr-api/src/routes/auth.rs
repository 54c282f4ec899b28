//! Authentication REST API Routes
//!
//! Handlers for registration, login, token refresh, logout, and credential
//! changes. Business logic lives in `SessionManager`; this module handles
//! HTTP shapes and the refresh cookie.
//!
//! The refresh token travels only in an HttpOnly SameSite=Strict cookie
//! scoped to /api/auth, so browser scripts never see it and it is not sent
//! with note or share requests.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::ApiConfig,
    error::{ApiError, ApiResult},
    middleware::{extract_device_label, AuthExtractor},
    session::SessionManager,
};
use papyr_core::PublicUser;

/// Name of the refresh token cookie.
pub const REFRESH_COOKIE: &str = "papyr_refresh";

/// Path the refresh cookie is scoped to.
const REFRESH_COOKIE_PATH: &str = "/api/auth";

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for auth routes.
#[derive(Clone)]
pub struct AuthRouteState {
    pub sessions: SessionManager,
    pub api_config: ApiConfig,
    /// Cookie lifetime, matching the refresh token's own expiry.
    pub refresh_cookie_max_age_secs: i64,
}

impl AuthRouteState {
    pub fn new(
        sessions: SessionManager,
        api_config: ApiConfig,
        refresh_cookie_max_age_secs: i64,
    ) -> Self {
        Self {
            sessions,
            api_config,
            refresh_cookie_max_age_secs,
        }
    }

    fn refresh_cookie(&self, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((REFRESH_COOKIE, value))
            .path(REFRESH_COOKIE_PATH)
            .http_only(true)
            .secure(self.api_config.secure_cookies)
            .same_site(SameSite::Strict)
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }

    fn clear_refresh_cookie(&self) -> Cookie<'static> {
        // Attributes must match the original cookie for browsers to drop it.
        self.refresh_cookie(String::new(), 0)
    }
}

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeUsernameRequest {
    pub username: String,
    /// Current password; renaming the account requires re-authentication.
    pub password: String,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/auth/register - Create an account and open a session
pub async fn register(
    State(state): State<Arc<AuthRouteState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let device = extract_device_label(&headers);

    let outcome = state
        .sessions
        .register(&req.username, &req.email, &req.password, &device)
        .await?;

    let jar = jar.add(
        state.refresh_cookie(outcome.tokens.refresh_token, state.refresh_cookie_max_age_secs),
    );

    Ok((
        StatusCode::CREATED,
        jar,
        Json(SessionResponse {
            user: outcome.user,
            access_token: outcome.tokens.access_token,
        }),
    ))
}

/// POST /api/auth/login - Authenticate and open a session
pub async fn login(
    State(state): State<Arc<AuthRouteState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let device = extract_device_label(&headers);

    let outcome = state
        .sessions
        .login(&req.email, &req.password, &device)
        .await?;

    let jar = jar.add(
        state.refresh_cookie(outcome.tokens.refresh_token, state.refresh_cookie_max_age_secs),
    );

    Ok((
        StatusCode::OK,
        jar,
        Json(SessionResponse {
            user: outcome.user,
            access_token: outcome.tokens.access_token,
        }),
    ))
}

/// POST /api/auth/refresh - Mint a new access token from the refresh cookie
///
/// The stored lineage is keyed by (user, device), so the same device label
/// the token was issued under must come back with it.
pub async fn refresh(
    State(state): State<Arc<AuthRouteState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::unauthorized("Refresh token cookie is missing"))?;

    let device = extract_device_label(&headers);
    let access_token = state.sessions.refresh(&refresh_token, &device).await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// POST /api/auth/logout - Revoke this device's session
///
/// Requires a valid access token; the cookie alone is not enough. Always
/// clears the cookie and returns 204, even if the refresh token was
/// already gone.
pub async fn logout(
    State(state): State<Arc<AuthRouteState>>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE) {
        state.sessions.logout(cookie.value()).await?;
    }

    let jar = jar.remove(state.clear_refresh_cookie());

    Ok((StatusCode::NO_CONTENT, jar))
}

/// GET /api/auth/me - Current account profile
pub async fn me(
    State(state): State<Arc<AuthRouteState>>,
    AuthExtractor(auth): AuthExtractor,
) -> ApiResult<impl IntoResponse> {
    let user = state.sessions.current_user(auth.user_id).await?;
    Ok(Json(user))
}

/// POST /api/auth/change-password - Change password, revoking all sessions
pub async fn change_password(
    State(state): State<Arc<AuthRouteState>>,
    AuthExtractor(auth): AuthExtractor,
    jar: CookieJar,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .sessions
        .change_password(auth.user_id, &req.current_password, &req.new_password)
        .await?;

    // This device's refresh token was revoked with the rest.
    let jar = jar.remove(state.clear_refresh_cookie());

    Ok((
        jar,
        Json(MessageResponse {
            message: "Password changed; all sessions have been logged out",
        }),
    ))
}

/// POST /api/auth/change-username - Change the account username
pub async fn change_username(
    State(state): State<Arc<AuthRouteState>>,
    AuthExtractor(auth): AuthExtractor,
    Json(req): Json<ChangeUsernameRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .sessions
        .change_username(auth.user_id, &req.username, &req.password)
        .await?;

    Ok(Json(user))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the auth routes router.
///
/// `/register`, `/login`, and `/refresh` are reachable without an access
/// token (refresh authenticates via the cookie); `auth_state` protects
/// logout and the account-management routes.
pub fn create_router(
    sessions: SessionManager,
    api_config: ApiConfig,
    auth_state: crate::middleware::AuthMiddlewareState,
) -> axum::Router {
    use axum::middleware::from_fn_with_state;
    use axum::routing::{get, post};

    let refresh_cookie_max_age_secs = auth_state.auth_config.refresh_expiration_secs;
    let state = Arc::new(AuthRouteState::new(
        sessions,
        api_config,
        refresh_cookie_max_age_secs,
    ));

    let protected = axum::Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
        .route("/change-username", post(change_username))
        .route_layer(from_fn_with_state(
            auth_state,
            crate::middleware::auth_middleware,
        ));

    axum::Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .merge(protected)
        .with_state(state)
}
