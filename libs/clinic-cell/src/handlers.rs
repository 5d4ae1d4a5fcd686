use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::error::AppError;
use shared_utils::extractor::TenantContext;

use crate::models::CreateClinicRequest;
use crate::services::ClinicService;

#[axum::debug_handler]
pub async fn create_clinic(
    State(state): State<AppState>,
    Json(request): Json<CreateClinicRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ClinicService::new(&state);
    let clinic = service.create_clinic(request).await?;

    Ok((StatusCode::CREATED, Json(json!(clinic))))
}

#[axum::debug_handler]
pub async fn get_current_clinic(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Value>, AppError> {
    let service = ClinicService::new(&state);
    let clinic = service.get_current_clinic(&tenant).await?;

    Ok(Json(json!(clinic)))
}
