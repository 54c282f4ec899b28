//! Papyr API Server Entry Point
//!
//! Bootstraps configuration from the environment and starts the Axum HTTP
//! server.

use std::net::SocketAddr;

use axum::Router;
use papyr_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AuthConfig, DbClient, DbConfig,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing();

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();

    let app: Router = create_api_router(db, &api_config, auth_config)?;

    let addr = resolve_bind_addr(&api_config)?;
    tracing::info!(%addr, "Starting Papyr API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("papyr_api=info,tower_http=info"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    // JSON logs in production, human-readable locally.
    if std::env::var("PAPYR_LOG_FORMAT").as_deref() == Ok("json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn resolve_bind_addr(config: &ApiConfig) -> ApiResult<SocketAddr> {
    // PORT (as set by most hosting platforms) overrides the configured port.
    let addr = match std::env::var("PORT").ok() {
        Some(port_str) => {
            let port = port_str
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;
            let host = config
                .bind_addr
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            format!("{}:{}", host, port)
        }
        None => config.bind_addr.clone(),
    };

    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
