use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::error::AppError;
use shared_utils::extractor::TenantContext;

use crate::models::DashboardQuery;
use crate::services::DashboardService;

#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Value>, AppError> {
    let summary = DashboardService::new(&state).get_dashboard(&tenant, query).await?;

    Ok(Json(json!(summary)))
}
