use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::error::AppError;
use shared_utils::extractor::TenantContext;

use crate::models::{AvailableTimesQuery, CreateDoctorRequest, UpdateDoctorRequest};
use crate::services::{AvailabilityService, DoctorService};

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(&state).list_doctors(&tenant).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor = DoctorService::new(&state).create_doctor(&tenant, request).await?;

    Ok((StatusCode::CREATED, Json(json!(doctor))))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state).get_doctor(&tenant, doctor_id).await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(&state)
        .update_doctor(&tenant, doctor_id, request)
        .await?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    DoctorService::new(&state).delete_doctor(&tenant, doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor deleted"
    })))
}

#[axum::debug_handler]
pub async fn get_available_times(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailableTimesQuery>,
) -> Result<Json<Value>, AppError> {
    let times = AvailabilityService::new(&state)
        .get_available_times(&tenant, doctor_id, query.date)
        .await?;

    Ok(Json(json!(times)))
}
