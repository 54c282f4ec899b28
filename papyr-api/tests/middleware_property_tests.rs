//! Property-Based Tests for Authentication Enforcement
//!
//! For any HTTP request to a protected route, IF the request lacks a valid
//! access token THEN the API SHALL return 401 Unauthorized. Routes behind
//! the optional middleware SHALL admit anonymous requests but still reject
//! requests presenting an invalid token.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use jsonwebtoken::Algorithm;
use papyr_api::auth::{generate_token, AuthConfig, FixedClock, SigningSecret, TokenKind};
use papyr_api::middleware::{auth_middleware, optional_auth_middleware, AuthMiddlewareState};
use proptest::prelude::*;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

// 2024-01-01 00:00:00 UTC
const TEST_EPOCH: i64 = 1_704_067_200;

fn test_auth_config() -> AuthConfig {
    AuthConfig {
        access_secret: SigningSecret::new("access-secret-for-middleware-tests-01".to_string()),
        refresh_secret: SigningSecret::new("refresh-secret-for-middleware-tests-02".to_string()),
        refresh_store_secret: SigningSecret::new("store-secret-for-middleware-tests-03".to_string()),
        password_hash_secret: SigningSecret::new("hash-secret-for-middleware-tests-04".to_string()),
        jwt_algorithm: Algorithm::HS256,
        access_expiration_secs: 900,
        refresh_expiration_secs: 604800,
        jwt_clock_skew_secs: 60,
        clock: Arc::new(FixedClock(TEST_EPOCH)),
    }
}

/// Create a test Axum app behind the required-auth middleware.
fn protected_app() -> Router {
    let auth_state = AuthMiddlewareState::new(test_auth_config());

    Router::new()
        .route("/api/notes", get(|| async { "Success" }))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware))
}

/// Create a test Axum app behind the optional-auth middleware.
fn optional_app() -> Router {
    let auth_state = AuthMiddlewareState::new(test_auth_config());

    Router::new()
        .route("/api/share/link", get(|| async { "Success" }))
        .layer(middleware::from_fn_with_state(
            auth_state,
            optional_auth_middleware,
        ))
}

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

/// Strategy for generating authorization headers.
#[derive(Debug, Clone)]
enum AuthHeader {
    /// Freshly signed access token
    ValidAccess { user_bytes: [u8; 16] },
    /// Refresh token presented where an access token is required
    RefreshAsAccess { user_bytes: [u8; 16] },
    /// Structurally JWT-shaped but not signed by us
    InvalidJwt(String),
    /// Authorization header without the Bearer scheme
    MalformedAuth(String),
    /// No authorization header
    None,
}

fn auth_header_strategy() -> impl Strategy<Value = AuthHeader> {
    prop_oneof![
        any::<[u8; 16]>().prop_map(|user_bytes| AuthHeader::ValidAccess { user_bytes }),
        any::<[u8; 16]>().prop_map(|user_bytes| AuthHeader::RefreshAsAccess { user_bytes }),
        "[A-Za-z0-9_-]{20,100}\\.[A-Za-z0-9_-]{20,100}\\.[A-Za-z0-9_-]{20,100}"
            .prop_map(AuthHeader::InvalidJwt),
        "[A-Za-z]+ [A-Za-z0-9_-]{20,50}".prop_map(AuthHeader::MalformedAuth),
        Just(AuthHeader::None),
    ]
}

fn apply_header(
    mut builder: axum::http::request::Builder,
    header: &AuthHeader,
    config: &AuthConfig,
) -> (axum::http::request::Builder, bool) {
    match header {
        AuthHeader::ValidAccess { user_bytes } => {
            let token = generate_token(
                config,
                TokenKind::Access,
                Uuid::from_bytes(*user_bytes),
                "user@example.com".to_string(),
            )
            .unwrap();
            builder = builder.header("authorization", format!("Bearer {}", token));
            (builder, true)
        }
        AuthHeader::RefreshAsAccess { user_bytes } => {
            let token = generate_token(
                config,
                TokenKind::Refresh,
                Uuid::from_bytes(*user_bytes),
                "user@example.com".to_string(),
            )
            .unwrap();
            builder = builder.header("authorization", format!("Bearer {}", token));
            (builder, false)
        }
        AuthHeader::InvalidJwt(token) => {
            builder = builder.header("authorization", format!("Bearer {}", token));
            (builder, false)
        }
        AuthHeader::MalformedAuth(value) => {
            builder = builder.header("authorization", value.clone());
            (builder, false)
        }
        AuthHeader::None => (builder, false),
    }
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any request to a protected route: valid access token means 200,
    /// anything else means 401.
    #[test]
    fn prop_protected_route_enforcement(header in auth_header_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let app = protected_app();
            let config = test_auth_config();

            let builder = Request::builder().uri("/api/notes");
            let (builder, is_valid) = apply_header(builder, &header, &config);
            let request = builder.body(Body::empty()).unwrap();

            let response = app.oneshot(request).await.unwrap();

            if is_valid {
                prop_assert_eq!(
                    response.status(),
                    StatusCode::OK,
                    "Expected 200 for valid access token"
                );
            } else {
                prop_assert_eq!(
                    response.status(),
                    StatusCode::UNAUTHORIZED,
                    "Expected 401 for {:?}",
                    header
                );
            }

            Ok(())
        })?;
    }

    /// For any request to an optionally-authenticated route: anonymous and
    /// valid-token requests pass, an invalid token is still a hard 401.
    #[test]
    fn prop_optional_route_enforcement(header in auth_header_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let app = optional_app();
            let config = test_auth_config();

            let builder = Request::builder().uri("/api/share/link");
            let (builder, is_valid) = apply_header(builder, &header, &config);
            let request = builder.body(Body::empty()).unwrap();

            let response = app.oneshot(request).await.unwrap();

            let expected = if is_valid || matches!(header, AuthHeader::None) {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            };

            prop_assert_eq!(
                response.status(),
                expected,
                "Unexpected status for {:?}",
                header
            );

            Ok(())
        })?;
    }
}

// ============================================================================
// UNIT TESTS FOR EDGE CASES
// ============================================================================

#[tokio::test]
async fn test_expired_access_token_returns_401() {
    let config = test_auth_config();
    let token = generate_token(
        &config,
        TokenKind::Access,
        Uuid::from_bytes([7; 16]),
        "user@example.com".to_string(),
    )
    .unwrap();

    // Middleware clock far past expiry plus skew.
    let late_config = AuthConfig {
        clock: Arc::new(FixedClock(TEST_EPOCH + 10_000)),
        ..test_auth_config()
    };
    let auth_state = AuthMiddlewareState::new(late_config);
    let app = Router::new()
        .route("/api/notes", get(|| async { "Success" }))
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    let request = Request::builder()
        .uri("/api/notes")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_bearer_token_returns_401() {
    let app = protected_app();

    let request = Request::builder()
        .uri("/api/notes")
        .header("authorization", "Bearer ")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
