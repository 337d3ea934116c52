//! # Availability Handlers
//!
//! Providers publish open windows here. The body is a list of RFC 3339
//! `start`/`end` pairs; each window is split into 15-minute slots. A
//! malformed window rejects the whole request.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use carebook_core::models::availability::{SetAvailabilityRequest, SetAvailabilityResponse};

use crate::{ApiState, middleware::error_handling::AppError};

/// ```text
/// PUT /api/providers/:id/availability
/// {"windows": [{"start": "2026-03-16T09:00:00Z", "end": "2026-03-16T10:00:00Z"}]}
/// ```
#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<String>,
    Json(payload): Json<SetAvailabilityRequest>,
) -> Result<Json<SetAvailabilityResponse>, AppError> {
    let response = state.engine.set_availability(&provider_id, &payload).await?;
    Ok(Json(response))
}
