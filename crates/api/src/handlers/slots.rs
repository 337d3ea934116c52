use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use carebook_core::{
    errors::BookingError,
    models::{
        reservation::{ReserveSlotRequest, ReserveSlotResponse},
        slot::GetAvailableSlotsResponse,
    },
};

use super::{DateQuery, parse_id};
use crate::{ApiState, middleware::error_handling::AppError};

/// `GET /api/providers/:id/slots?date=YYYY-MM-DD`
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<GetAvailableSlotsResponse>, AppError> {
    let date = query
        .date
        .ok_or_else(|| BookingError::Validation("date query parameter is required".to_string()))?;

    let slots = state.engine.available_slots(&provider_id, &date).await?;
    Ok(Json(GetAvailableSlotsResponse {
        slots: slots.into_iter().map(Into::into).collect(),
    }))
}

#[axum::debug_handler]
pub async fn reserve_slot(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<String>,
    Json(payload): Json<ReserveSlotRequest>,
) -> Result<(StatusCode, Json<ReserveSlotResponse>), AppError> {
    let slot_id = parse_id(&slot_id, "slot")?;
    let response = state.engine.reserve_slot(slot_id, &payload.client_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
