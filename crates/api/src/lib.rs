//! # Carebook API
//!
//! HTTP transport for the booking engine: providers publish availability,
//! clients reserve and confirm 15-minute slots, and both can list what is
//! booked.
//!
//! ## Architecture
//!
//! - **Routes**: API endpoints and URL structure
//! - **Handlers**: extract and validate requests, call the engine
//! - **Middleware**: error-to-status mapping
//! - **Config**: environment configuration
//!
//! All state lives behind the engine's persistence gateway; the server
//! itself holds nothing but a handle to it.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use carebook_engine::BookingEngine;
use eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub engine: BookingEngine,
}

/// Builds the router with every endpoint and no transport layers.
pub fn router(engine: BookingEngine) -> Router {
    let state = Arc::new(ApiState { engine });

    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Provider registry and availability publishing
        .merge(routes::providers::routes())
        // Slot listing and reservation
        .merge(routes::slots::routes())
        // Confirmation and reservation listings
        .merge(routes::reservations::routes())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).wrap_err_with(|| format!("Invalid CORS origin {origin:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(origins))
}

/// Starts the API server and serves until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn start_server(
    config: &config::ApiConfig,
    engine: BookingEngine,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = router(engine);

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) if !origins.is_empty() => app.layer(cors_layer(origins)?),
        _ => app,
    };

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    );

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped");
    Ok(())
}
