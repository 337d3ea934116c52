use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use carebook_core::models::provider::{CreateProviderRequest, ProviderResponse, RenameProviderRequest};

use crate::{ApiState, middleware::error_handling::AppError};

#[axum::debug_handler]
pub async fn create_provider(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateProviderRequest>,
) -> Result<(StatusCode, Json<ProviderResponse>), AppError> {
    let provider = state.engine.create_provider(&payload).await?;
    Ok((StatusCode::CREATED, Json(provider.into())))
}

#[axum::debug_handler]
pub async fn get_provider(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ProviderResponse>, AppError> {
    let provider = state.engine.get_provider(&id).await?;
    Ok(Json(provider.into()))
}

#[axum::debug_handler]
pub async fn rename_provider(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(payload): Json<RenameProviderRequest>,
) -> Result<Json<ProviderResponse>, AppError> {
    let provider = state.engine.rename_provider(&id, &payload.name).await?;
    Ok(Json(provider.into()))
}
