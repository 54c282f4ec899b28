//! REST API Routes Module
//!
//! This module contains all REST API route handlers organized by area.
//!
//! Includes:
//! - Auth routes (register, login, refresh, logout, account changes)
//! - Note CRUD routes with pagination, search, and status transitions
//! - Share routes (owner management plus public link resolution)
//! - Health check endpoints
//! - CORS support for browser-based clients

pub mod auth;
pub mod health;
pub mod note;
pub mod share;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::AuthConfig;
use crate::config::ApiConfig;
use crate::db::DbClient;
use crate::error::{ApiError, ApiResult};
use crate::guard::GuardState;
use crate::middleware::{auth_middleware, optional_auth_middleware, AuthMiddlewareState};
use crate::session::SessionManager;
use crate::sharing::SharingManager;

// Re-export route creation functions for convenience
pub use auth::create_router as auth_router;
pub use health::create_router as health_router;
pub use note::create_router as note_router;
pub use share::{create_owner_router as share_owner_router, create_public_router as share_public_router};

// ============================================================================
// PRODUCTION VALIDATION
// ============================================================================

/// Check if running in a production environment.
fn is_production_environment() -> bool {
    std::env::var("PAPYR_ENVIRONMENT")
        .map(|e| matches!(e.to_lowercase().as_str(), "production" | "prod"))
        .unwrap_or(false)
}

/// Validate API configuration for production use.
fn validate_api_config_for_production(config: &ApiConfig) -> ApiResult<()> {
    if config.cors_origins.is_empty() {
        return Err(ApiError::invalid_input(
            "CORS origins not configured for production. Set PAPYR_CORS_ORIGINS.",
        ));
    }
    if !config.secure_cookies {
        tracing::warn!(
            "Secure cookies are disabled in production - refresh tokens will travel over \
             plain HTTP. Set PAPYR_SECURE_COOKIES=true."
        );
    }
    Ok(())
}

// ============================================================================
// SECURE ROUTER BUILDER
// ============================================================================

/// Builder for the API router with auth enforced by default.
///
/// Note and owner-share routes sit behind the access-token middleware plus
/// the relevant note guard. Public share resolution runs behind optional
/// auth so logged-out visitors can follow links. Health checks are open.
pub struct SecureRouterBuilder {
    db: DbClient,
    api_config: ApiConfig,
    auth_config: Arc<AuthConfig>,
}

impl SecureRouterBuilder {
    /// Create a new SecureRouterBuilder.
    ///
    /// In production environments, this validates that secrets and CORS are
    /// properly configured and returns an error if critical settings are
    /// missing.
    pub fn new(db: DbClient, api_config: ApiConfig, auth_config: AuthConfig) -> ApiResult<Self> {
        if is_production_environment() {
            auth_config.validate_for_production()?;
            validate_api_config_for_production(&api_config)?;
        }

        Ok(Self {
            db,
            api_config,
            auth_config: Arc::new(auth_config),
        })
    }

    fn auth_state(&self) -> AuthMiddlewareState {
        AuthMiddlewareState {
            auth_config: self.auth_config.clone(),
        }
    }

    /// Build the complete router.
    ///
    /// # Middleware Order (outer to inner)
    /// 1. CORS (outermost) - handles preflight requests
    /// 2. Request tracing
    /// 3. Auth (per subtree) - validates credentials
    /// 4. Note guards (per route) - ownership and share access
    pub fn build(self) -> ApiResult<Router> {
        use tower_http::trace::TraceLayer;

        let guard_state = GuardState::new(self.db.clone());
        let sessions = SessionManager::new(self.db.clone(), self.auth_config.clone());
        let sharing = SharingManager::new(self.db.clone());

        // Note CRUD plus owner-facing share management, both behind a
        // required access token. Paths are disjoint, so the merge is safe.
        let note_routes = note::create_router(self.db.clone(), guard_state.clone())
            .merge(share::create_owner_router(sharing.clone(), guard_state))
            .layer(from_fn_with_state(self.auth_state(), auth_middleware));

        // Public link resolution: anonymous allowed, identity attached when
        // a valid token is presented.
        let share_routes = share::create_public_router(sharing).layer(from_fn_with_state(
            self.auth_state(),
            optional_auth_middleware,
        ));

        let auth_routes =
            auth::create_router(sessions, self.api_config.clone(), self.auth_state());

        let cors = build_cors_layer(&self.api_config);

        Ok(Router::new()
            .nest("/api/auth", auth_routes)
            .nest("/api/notes", note_routes)
            .nest("/api/share", share_routes)
            .nest("/health", health::create_router(self.db))
            .layer(TraceLayer::new_for_http())
            .layer(cors))
    }
}

/// Create the complete API router with all routes and authentication.
pub fn create_api_router(
    db: DbClient,
    api_config: &ApiConfig,
    auth_config: AuthConfig,
) -> ApiResult<Router> {
    SecureRouterBuilder::new(db, api_config.clone(), auth_config).and_then(|builder| builder.build())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins without
/// credentials. In production mode, only configured origins are allowed,
/// with credentials enabled so the refresh cookie flows.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        // Development mode: allow all origins. Credentials cannot be
        // combined with a wildcard origin.
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        cors.allow_origin(origins)
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
                HeaderName::from_static("x-device"),
            ])
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_modules_compile() {
        // Verifies all route modules are properly exported.
        let _ = auth::AuthRouteState::new;
        let _ = health::HealthState::new;
        let _ = note::NoteState::new;
        let _ = share::ShareState::new;
    }

    #[test]
    fn test_cors_layer_builds_for_both_modes() {
        let dev = ApiConfig::default();
        let _ = build_cors_layer(&dev);

        let prod = ApiConfig {
            cors_origins: vec!["https://papyr.app".to_string()],
            ..ApiConfig::default()
        };
        let _ = build_cors_layer(&prod);
    }
}
