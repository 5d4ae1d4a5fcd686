use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::schedule::{AvailabilityWindow, DateOutOfRange};
use shared_utils::extractor::ForeignTenant;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub name: String,
    pub specialty: String,
    pub appointment_price_in_cents: i64,
    pub color: Option<String>,
    #[serde(flatten)]
    pub availability: AvailabilityWindow,
}

/// Full replacement of the editable fields.
pub type UpdateDoctorRequest = CreateDoctorRequest;

impl CreateDoctorRequest {
    pub fn validate(&self) -> Result<(), DoctorError> {
        if self.name.trim().is_empty() {
            return Err(DoctorError::ValidationError("Doctor name is required".to_string()));
        }
        if self.specialty.trim().is_empty() {
            return Err(DoctorError::ValidationError("Specialty is required".to_string()));
        }
        if self.appointment_price_in_cents < 0 {
            return Err(DoctorError::ValidationError(
                "Appointment price cannot be negative".to_string(),
            ));
        }
        if let Some(color) = &self.color {
            let hex = color.strip_prefix('#').unwrap_or_default();
            if !matches!(hex.len(), 3 | 6) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(DoctorError::ValidationError(format!("Invalid color '{}'", color)));
            }
        }
        self.availability.validate().map_err(DoctorError::ValidationError)
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailableTimesQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// One bookable slot start on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableTime {
    /// Clinic-local start, `HH:mm`.
    pub value: String,
    pub available: bool,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Unauthorized access to doctor: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for DoctorError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => DoctorError::NotFound,
            other => DoctorError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ForeignTenant> for DoctorError {
    fn from(err: ForeignTenant) -> Self {
        DoctorError::Forbidden(err.to_string())
    }
}

impl From<DateOutOfRange> for DoctorError {
    fn from(err: DateOutOfRange) -> Self {
        DoctorError::ValidationError(err.to_string())
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::Forbidden(msg) => AppError::Forbidden(msg),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::DatabaseError(msg) => AppError::unexpected(msg),
        }
    }
}
