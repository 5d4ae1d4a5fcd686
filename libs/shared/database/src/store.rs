use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use shared_models::clinic::{Appointment, Clinic, Doctor, Patient};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A storage-level rule rejected the write, e.g. the overlapping
    /// appointment exclusion constraint.
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Calendar listing filter. `from` is inclusive, `to` exclusive, both on the
/// appointment start.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppointmentFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub doctor_id: Option<Uuid>,
}

impl AppointmentFilter {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.from.map_or(true, |from| appointment.date >= from)
            && self.to.map_or(true, |to| appointment.date < to)
            && self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
    }
}

/// Persistence seam for the clinic tables.
///
/// Lookups by id are not tenant-scoped so services can tell a missing row
/// from one owned by another clinic. Soft-deleted rows are never returned.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    async fn insert_clinic(&self, clinic: Clinic) -> StoreResult<Clinic>;
    async fn get_clinic(&self, id: Uuid) -> StoreResult<Option<Clinic>>;

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor>;
    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor>;
    async fn get_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>>;
    async fn list_doctors(&self, clinic_id: Uuid) -> StoreResult<Vec<Doctor>>;
    async fn soft_delete_doctor(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient>;
    async fn update_patient(&self, patient: Patient) -> StoreResult<Patient>;
    async fn get_patient(&self, id: Uuid) -> StoreResult<Option<Patient>>;
    /// Case-insensitive substring match on the name when `search` is set.
    async fn list_patients(&self, clinic_id: Uuid, search: Option<&str>) -> StoreResult<Vec<Patient>>;
    async fn soft_delete_patient(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    /// Fails with [`StoreError::Constraint`] when the doctor already has a
    /// live appointment overlapping the new interval.
    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;
    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;
    async fn get_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>>;
    /// Ordered by start.
    async fn list_appointments(&self, clinic_id: Uuid, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>>;
    /// Live appointments of a doctor intersecting `[start, end)`, ordered by start.
    async fn doctor_appointments_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> StoreResult<Vec<Appointment>>;
    async fn soft_delete_appointment(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;
}
