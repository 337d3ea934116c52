use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use carebook_core::models::reservation::{ConfirmReservationResponse, ReservationListResponse};

use super::{DateQuery, parse_id};
use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn confirm_reservation(
    State(state): State<Arc<ApiState>>,
    Path(reservation_id): Path<String>,
) -> Result<Json<ConfirmReservationResponse>, AppError> {
    let reservation_id = parse_id(&reservation_id, "reservation")?;
    let response = state.engine.confirm_reservation(reservation_id).await?;
    Ok(Json(response))
}

/// `GET /api/providers/:id/reservations[?date=YYYY-MM-DD]`
#[axum::debug_handler]
pub async fn provider_reservations(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ReservationListResponse>, AppError> {
    let reservations = state
        .engine
        .reservations_for_provider(&provider_id, query.date.as_deref())
        .await?;
    Ok(Json(ReservationListResponse { reservations }))
}

/// `GET /api/clients/:id/reservations[?date=YYYY-MM-DD]`
#[axum::debug_handler]
pub async fn client_reservations(
    State(state): State<Arc<ApiState>>,
    Path(client_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ReservationListResponse>, AppError> {
    let reservations = state
        .engine
        .reservations_for_client(&client_id, query.date.as_deref())
        .await?;
    Ok(Json(ReservationListResponse { reservations }))
}
