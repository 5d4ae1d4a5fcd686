use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::clinic::{Appointment, Doctor};
use shared_models::schedule::ClinicClock;

use crate::models::{AppointmentError, ConflictCheckResponse};

/// Decides whether `[start, end)` can be booked with a doctor.
///
/// Availability is re-derived from the doctor's weekly window rather than the
/// slot grid, so any length that fits inside the window passes. Appointment
/// status never frees a slot; only soft deletion does.
pub struct ConflictDetectionService {
    store: Arc<dyn ClinicStore>,
    clock: ClinicClock,
}

impl ConflictDetectionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock(),
        }
    }

    /// Fails with the first rule the interval breaks.
    pub async fn ensure_bookable(
        &self,
        doctor: &Doctor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        validate_interval(start, end)?;

        if !doctor.availability.contains(&self.clock, start, end) {
            warn!(
                "Rejected {} - {} for doctor {}: outside availability",
                start, end, doctor.id
            );
            return Err(AppointmentError::OutOfAvailability);
        }

        let conflicts = self
            .conflicting_appointments(doctor.id, start, end, exclude_appointment_id)
            .await?;
        if let Some(existing) = conflicts.first() {
            warn!(
                "Rejected {} - {} for doctor {}: overlaps appointment {}",
                start, end, doctor.id, existing.id
            );
            return Err(AppointmentError::ConflictDetected);
        }

        Ok(())
    }

    /// Read-only report of both rules.
    pub async fn check_conflicts(
        &self,
        doctor: &Doctor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        validate_interval(start, end)?;
        debug!("Checking conflicts for doctor {} from {} to {}", doctor.id, start, end);

        let conflicting_appointments = self
            .conflicting_appointments(doctor.id, start, end, exclude_appointment_id)
            .await?;

        Ok(ConflictCheckResponse {
            has_conflict: !conflicting_appointments.is_empty(),
            within_availability: doctor.availability.contains(&self.clock, start, end),
            conflicting_appointments,
        })
    }

    async fn conflicting_appointments(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let existing = self
            .store
            .doctor_appointments_overlapping(doctor_id, start, end, exclude_appointment_id)
            .await?;

        Ok(existing
            .into_iter()
            .filter(|a| Some(a.id) != exclude_appointment_id && !a.is_deleted() && a.overlaps(start, end))
            .collect())
    }
}

fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppointmentError> {
    if start < end {
        Ok(())
    } else {
        Err(AppointmentError::ValidationError(
            "Appointment start must be before its end".to_string(),
        ))
    }
}
