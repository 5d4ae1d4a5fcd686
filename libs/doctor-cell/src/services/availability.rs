use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::clinic::Appointment;
use shared_models::schedule::{AvailabilityWindow, ClinicClock, TimeOfDay};
use shared_utils::extractor::TenantContext;

use crate::models::{AvailableTime, DoctorError};
use crate::services::doctor::DoctorService;

pub struct AvailabilityService {
    store: Arc<dyn ClinicStore>,
    doctors: DoctorService,
    clock: ClinicClock,
    slot_minutes: u32,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            doctors: DoctorService::new(state),
            clock: state.clock(),
            slot_minutes: state.slot_minutes(),
        }
    }

    /// Bookable slot starts of a doctor on a clinic-local day, each flagged
    /// with whether an existing appointment already overlaps it.
    pub async fn get_available_times(
        &self,
        tenant: &TenantContext,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailableTime>, DoctorError> {
        debug!("Calculating available times for doctor {} on {}", doctor_id, date);

        let doctor = self.doctors.get_doctor(tenant, doctor_id).await?;
        if !doctor.availability.covers_date(date) {
            debug!("Doctor {} does not work on {}", doctor_id, date);
            return Ok(Vec::new());
        }

        let (day_start, day_end) = self.clock.day_bounds(date)?;
        let appointments = self
            .store
            .doctor_appointments_overlapping(doctor.id, day_start, day_end, None)
            .await?;

        let times = available_times(
            &doctor.availability,
            &self.clock,
            date,
            self.slot_minutes,
            &appointments,
        );
        debug!(
            "Found {} slots ({} free)",
            times.len(),
            times.iter().filter(|t| t.available).count()
        );
        Ok(times)
    }
}

/// Slot starts the window offers on `date`; empty on uncovered weekdays.
pub fn slot_starts_for(window: &AvailabilityWindow, date: NaiveDate, slot_minutes: u32) -> Vec<TimeOfDay> {
    if window.covers_date(date) {
        window.slot_starts(slot_minutes)
    } else {
        Vec::new()
    }
}

/// Canceled appointments still occupy their slot; only deleted ones free it.
pub fn available_times(
    window: &AvailabilityWindow,
    clock: &ClinicClock,
    date: NaiveDate,
    slot_minutes: u32,
    appointments: &[Appointment],
) -> Vec<AvailableTime> {
    slot_starts_for(window, date, slot_minutes)
        .into_iter()
        .filter_map(|start| {
            let slot_start = clock.to_utc(date, start).ok()?;
            let slot_end = slot_start.checked_add_signed(Duration::minutes(i64::from(slot_minutes)))?;
            let taken = appointments
                .iter()
                .any(|a| !a.is_deleted() && a.overlaps(slot_start, slot_end));
            Some(AvailableTime {
                value: start.to_string(),
                available: !taken,
            })
        })
        .collect()
}
