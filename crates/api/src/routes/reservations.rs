use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/reservations/:id/confirm",
            post(handlers::reservations::confirm_reservation),
        )
        .route(
            "/api/providers/:id/reservations",
            get(handlers::reservations::provider_reservations),
        )
        .route(
            "/api/clients/:id/reservations",
            get(handlers::reservations::client_reservations),
        )
}
