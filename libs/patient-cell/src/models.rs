use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::clinic::PatientSex;
use shared_models::error::AppError;
use shared_utils::extractor::ForeignTenant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub sex: PatientSex,
}

pub type UpdatePatientRequest = CreatePatientRequest;

impl CreatePatientRequest {
    pub fn validate(&self) -> Result<(), PatientError> {
        if self.name.trim().is_empty() {
            return Err(PatientError::ValidationError("Patient name is required".to_string()));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(PatientError::ValidationError(format!("Invalid email '{}'", self.email)));
        }
        if self.phone_number.trim().is_empty() {
            return Err(PatientError::ValidationError("Phone number is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientSearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient not found")]
    NotFound,

    #[error("Unauthorized access to patient data: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for PatientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => PatientError::NotFound,
            other => PatientError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ForeignTenant> for PatientError {
    fn from(err: ForeignTenant) -> Self {
        PatientError::Forbidden(err.to_string())
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::Forbidden(msg) => AppError::Forbidden(msg),
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            PatientError::DatabaseError(msg) => AppError::unexpected(msg),
        }
    }
}
