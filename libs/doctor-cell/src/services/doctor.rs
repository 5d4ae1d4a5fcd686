use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::clinic::Doctor;
use shared_utils::extractor::TenantContext;

use crate::models::{CreateDoctorRequest, DoctorError, UpdateDoctorRequest};

pub struct DoctorService {
    store: Arc<dyn ClinicStore>,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn create_doctor(
        &self,
        tenant: &TenantContext,
        request: CreateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        request.validate()?;

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            clinic_id: tenant.clinic_id,
            name: request.name.trim().to_string(),
            specialty: request.specialty.trim().to_string(),
            appointment_price_in_cents: request.appointment_price_in_cents,
            color: request.color,
            availability: request.availability,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let doctor = self.store.insert_doctor(doctor).await?;
        info!("Doctor {} created in clinic {}", doctor.id, doctor.clinic_id);
        Ok(doctor)
    }

    /// Loads a live doctor and checks it belongs to the caller's clinic.
    pub async fn get_doctor(&self, tenant: &TenantContext, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor {}", doctor_id);

        let doctor = self
            .store
            .get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)?;
        tenant.ensure_same_clinic("doctor", doctor.clinic_id)?;
        Ok(doctor)
    }

    pub async fn list_doctors(&self, tenant: &TenantContext) -> Result<Vec<Doctor>, DoctorError> {
        Ok(self.store.list_doctors(tenant.clinic_id).await?)
    }

    /// Existing appointments keep their price snapshot.
    pub async fn update_doctor(
        &self,
        tenant: &TenantContext,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        request.validate()?;
        let current = self.get_doctor(tenant, doctor_id).await?;

        let updated = Doctor {
            name: request.name.trim().to_string(),
            specialty: request.specialty.trim().to_string(),
            appointment_price_in_cents: request.appointment_price_in_cents,
            color: request.color,
            availability: request.availability,
            updated_at: Utc::now(),
            ..current
        };

        let doctor = self.store.update_doctor(updated).await?;
        info!("Doctor {} updated", doctor.id);
        Ok(doctor)
    }

    pub async fn delete_doctor(&self, tenant: &TenantContext, doctor_id: Uuid) -> Result<(), DoctorError> {
        self.get_doctor(tenant, doctor_id).await?;

        if !self.store.soft_delete_doctor(doctor_id, Utc::now()).await? {
            return Err(DoctorError::NotFound);
        }
        info!("Doctor {} deleted", doctor_id);
        Ok(())
    }
}
