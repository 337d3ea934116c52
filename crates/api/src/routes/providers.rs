use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/providers", post(handlers::providers::create_provider))
        .route(
            "/api/providers/:id",
            get(handlers::providers::get_provider).put(handlers::providers::rename_provider),
        )
        .route(
            "/api/providers/:id/availability",
            put(handlers::availability::set_availability),
        )
}
