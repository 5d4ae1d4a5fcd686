use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::availability::slot_starts_for;
use shared_database::{AppState, AppointmentFilter, ClinicStore};
use shared_models::clinic::{Appointment, AppointmentStatus, Doctor, Patient};
use shared_models::schedule::{ClinicClock, TimeOfDay};
use shared_utils::extractor::TenantContext;

use crate::models::{
    AppointmentError, AppointmentListQuery, BookAppointmentRequest, ConflictCheckQuery,
    ConflictCheckResponse, RescheduleAppointmentRequest, UpdateAppointmentStatusRequest,
};
use crate::services::conflict::ConflictDetectionService;

pub struct AppointmentBookingService {
    store: Arc<dyn ClinicStore>,
    conflict_service: ConflictDetectionService,
    clock: ClinicClock,
    slot_minutes: u32,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            conflict_service: ConflictDetectionService::new(state),
            clock: state.clock(),
            slot_minutes: state.slot_minutes(),
        }
    }

    pub async fn book_appointment(
        &self,
        tenant: &TenantContext,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for patient {} with doctor {} on {}",
            request.patient_id, request.doctor_id, request.date
        );

        let start_time = TimeOfDay::parse(&request.start_time)?;
        let end_time = TimeOfDay::parse(&request.end_time)?;

        let doctor = self.load_doctor(tenant, request.doctor_id).await?;
        let patient = self.load_patient(tenant, request.patient_id).await?;

        let start = self.clock.to_utc(request.date, start_time)?;
        let end = self.clock.to_utc(request.date, end_time)?;

        self.conflict_service
            .ensure_bookable(&doctor, start, end, None)
            .await?;

        if !slot_starts_for(&doctor.availability, request.date, self.slot_minutes).contains(&start_time) {
            warn!("Start {} is off the {}-minute grid of doctor {}", start_time, self.slot_minutes, doctor.id);
            return Err(AppointmentError::ValidationError(format!(
                "Start time {} is not one of the doctor's available times",
                start_time
            )));
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            clinic_id: tenant.clinic_id,
            doctor_id: doctor.id,
            patient_id: patient.id,
            date: start,
            end_date: end,
            appointment_price_in_cents: doctor.appointment_price_in_cents,
            status: AppointmentStatus::Pending,
            budget_id: request.budget_id,
            treatment_id: request.treatment_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let appointment = self.store.insert_appointment(appointment).await.map_err(|e| {
            warn!("Store rejected appointment for doctor {}: {}", doctor.id, e);
            AppointmentError::from(e)
        })?;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    /// Moves an appointment to a new absolute interval. Price and status are kept.
    pub async fn reschedule_appointment(
        &self,
        tenant: &TenantContext,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let (Some(start), Some(end)) = (request.date, request.end_date) else {
            return Err(AppointmentError::ValidationError(
                "Both date and end_date are required to reschedule".to_string(),
            ));
        };

        let current = self.get_appointment(tenant, appointment_id).await?;
        let doctor = self
            .store
            .get_doctor(current.doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        self.conflict_service
            .ensure_bookable(&doctor, start, end, Some(current.id))
            .await?;

        let updated = self
            .store
            .update_appointment(Appointment {
                date: start,
                end_date: end,
                updated_at: Utc::now(),
                ..current
            })
            .await?;

        info!("Appointment {} rescheduled to {} - {}", updated.id, start, end);
        Ok(updated)
    }

    pub async fn delete_appointment(
        &self,
        tenant: &TenantContext,
        appointment_id: Uuid,
    ) -> Result<(), AppointmentError> {
        self.get_appointment(tenant, appointment_id).await?;

        if !self.store.soft_delete_appointment(appointment_id, Utc::now()).await? {
            return Err(AppointmentError::NotFound);
        }

        info!("Appointment {} deleted", appointment_id);
        Ok(())
    }

    pub async fn get_appointment(
        &self,
        tenant: &TenantContext,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment {}", appointment_id);

        let appointment = self
            .store
            .get_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)?;
        tenant.ensure_same_clinic("appointment", appointment.clinic_id)?;
        Ok(appointment)
    }

    pub async fn list_appointments(
        &self,
        tenant: &TenantContext,
        query: AppointmentListQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AppointmentError::ValidationError(
                    "'from' must not be after 'to'".to_string(),
                ));
            }
        }

        let filter = AppointmentFilter {
            from: query.from.map(|day| self.clock.day_bounds(day)).transpose()?.map(|(start, _)| start),
            to: query.to.map(|day| self.clock.day_bounds(day)).transpose()?.map(|(_, end)| end),
            doctor_id: query.doctor_id,
        };

        Ok(self.store.list_appointments(tenant.clinic_id, filter).await?)
    }

    /// Status is informational; it never re-runs the conflict check.
    pub async fn update_status(
        &self,
        tenant: &TenantContext,
        appointment_id: Uuid,
        request: UpdateAppointmentStatusRequest,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(tenant, appointment_id).await?;
        let previous = current.status;

        let updated = self
            .store
            .update_appointment(Appointment {
                status: request.status,
                updated_at: Utc::now(),
                ..current
            })
            .await?;

        info!("Appointment {} status {} -> {}", updated.id, previous, updated.status);
        Ok(updated)
    }

    pub async fn check_conflicts(
        &self,
        tenant: &TenantContext,
        query: ConflictCheckQuery,
    ) -> Result<ConflictCheckResponse, AppointmentError> {
        let doctor = self.load_doctor(tenant, query.doctor_id).await?;
        self.conflict_service
            .check_conflicts(&doctor, query.date, query.end_date, query.exclude_appointment_id)
            .await
    }

    async fn load_doctor(&self, tenant: &TenantContext, doctor_id: Uuid) -> Result<Doctor, AppointmentError> {
        let doctor = self
            .store
            .get_doctor(doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;
        tenant.ensure_same_clinic("doctor", doctor.clinic_id)?;
        Ok(doctor)
    }

    async fn load_patient(&self, tenant: &TenantContext, patient_id: Uuid) -> Result<Patient, AppointmentError> {
        let patient = self
            .store
            .get_patient(patient_id)
            .await?
            .ok_or(AppointmentError::PatientNotFound)?;
        tenant.ensure_same_clinic("patient", patient.clinic_id)?;
        Ok(patient)
    }
}
