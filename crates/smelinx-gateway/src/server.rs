// SPDX-FileCopyrightText: 2026 Smelinx Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, put},
};
use smelinx_config::model::GatewayConfig;
use smelinx_core::{SessionValidator, SmelinxError};
use smelinx_registry::Registry;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub validator: Arc<dyn SessionValidator>,
    /// Process start time for uptime reporting.
    pub started: Instant,
}

impl AppState {
    pub fn new(registry: Registry, validator: Arc<dyn SessionValidator>) -> Self {
        Self {
            registry,
            validator,
            started: Instant::now(),
        }
    }
}

/// Gateway server configuration (mirrors GatewayConfig from smelinx-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Build the application router.
///
/// `GET /health` is public; every other route requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/apis", get(handlers::list_apis).post(handlers::create_api))
        .route(
            "/apis/{id}",
            get(handlers::get_api)
                .put(handlers::update_api)
                .delete(handlers::delete_api),
        )
        .route(
            "/apis/{id}/versions",
            get(handlers::list_versions).post(handlers::create_version),
        )
        .route(
            "/versions/{id}",
            put(handlers::update_version).delete(handlers::delete_version),
        )
        .route(
            "/apis/{id}/notifications",
            get(handlers::list_notifications).post(handlers::create_notification),
        )
        .route(
            "/notifications/{id}",
            put(handlers::update_notification).delete(handlers::delete_notification),
        )
        .route(
            "/apis/{id}/consumers",
            get(handlers::list_consumers).post(handlers::create_consumer),
        )
        .route(
            "/consumers/{id}",
            axum::routing::delete(handlers::delete_consumer),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.validator.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until `cancel` fires, then drain in-flight requests.
pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), SmelinxError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SmelinxError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| SmelinxError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_from_gateway_config() {
        let config = ServerConfig::from(&GatewayConfig::default());
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(format!("{config:?}").contains("127.0.0.1"));
    }
}
