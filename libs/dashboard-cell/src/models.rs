use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::clinic::Appointment;
use shared_models::error::AppError;
use shared_models::schedule::DateOutOfRange;

/// Longest range the dashboard accepts, in days.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Inclusive clinic-local day range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorCount {
    pub doctor_id: Uuid,
    pub name: String,
    pub specialty: String,
    pub appointments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialtyCount {
    pub specialty: String,
    pub appointments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub appointments: u64,
    pub revenue_in_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_revenue_in_cents: i64,
    pub total_appointments: u64,
    pub total_patients: u64,
    pub total_doctors: u64,
    pub top_doctors: Vec<DoctorCount>,
    pub top_specialties: Vec<SpecialtyCount>,
    pub daily: Vec<DailyPoint>,
    pub today_appointments: Vec<Appointment>,
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<StoreError> for DashboardError {
    fn from(err: StoreError) -> Self {
        DashboardError::DatabaseError(err.to_string())
    }
}

impl From<DateOutOfRange> for DashboardError {
    fn from(err: DateOutOfRange) -> Self {
        DashboardError::ValidationError(err.to_string())
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::ValidationError(msg) => AppError::ValidationError(msg),
            DashboardError::DatabaseError(msg) => AppError::unexpected(msg),
        }
    }
}
