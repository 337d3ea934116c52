use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/providers/:id/slots",
            get(handlers::slots::get_available_slots),
        )
        .route("/api/slots/:id/reserve", post(handlers::slots::reserve_slot))
}
