use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("Clinic not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for ClinicError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ClinicError::NotFound,
            other => ClinicError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ClinicError> for AppError {
    fn from(err: ClinicError) -> Self {
        match err {
            ClinicError::NotFound => AppError::NotFound(err.to_string()),
            ClinicError::ValidationError(msg) => AppError::ValidationError(msg),
            ClinicError::DatabaseError(msg) => AppError::unexpected(msg),
        }
    }
}
