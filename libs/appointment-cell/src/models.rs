use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::clinic::{Appointment, AppointmentStatus};
use shared_models::error::AppError;
use shared_models::schedule::{DateOutOfRange, TimeParseError};
use shared_utils::extractor::ForeignTenant;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking input in the clinic's wall clock: a calendar day plus `HH:mm` times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub budget_id: Option<Uuid>,
    #[serde(default)]
    pub treatment_id: Option<Uuid>,
}

/// New absolute interval for a drag-and-drop move. Both ends are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppointmentStatusRequest {
    pub status: AppointmentStatus,
}

/// Calendar listing; `from`/`to` are inclusive clinic-local days.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckQuery {
    pub doctor_id: Uuid,
    pub date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub exclude_appointment_id: Option<Uuid>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    pub within_availability: bool,
    pub conflicting_appointments: Vec<Appointment>,
}

impl ConflictCheckResponse {
    pub fn is_bookable(&self) -> bool {
        self.within_availability && !self.has_conflict
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Unauthorized access: {0}")]
    Forbidden(String),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Requested time is outside the doctor's availability")]
    OutOfAvailability,

    #[error("Appointment conflicts with existing booking")]
    ConflictDetected,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppointmentError::NotFound,
            StoreError::Constraint(_) => AppointmentError::ConflictDetected,
            StoreError::Backend(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

impl From<ForeignTenant> for AppointmentError {
    fn from(err: ForeignTenant) -> Self {
        AppointmentError::Forbidden(err.to_string())
    }
}

impl From<TimeParseError> for AppointmentError {
    fn from(err: TimeParseError) -> Self {
        AppointmentError::InvalidTime(err.to_string())
    }
}

impl From<DateOutOfRange> for AppointmentError {
    fn from(err: DateOutOfRange) -> Self {
        AppointmentError::ValidationError(err.to_string())
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::PatientNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::Forbidden(msg) => AppError::Forbidden(msg),
            AppointmentError::InvalidTime(_)
            | AppointmentError::OutOfAvailability
            | AppointmentError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            AppointmentError::ConflictDetected => AppError::Conflict(err.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::unexpected(msg),
        }
    }
}
