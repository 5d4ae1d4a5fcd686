use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::clinic::Patient;
use shared_utils::extractor::TenantContext;

use crate::models::{CreatePatientRequest, PatientError, PatientSearchQuery, UpdatePatientRequest};

pub struct PatientService {
    store: Arc<dyn ClinicStore>,
}

impl PatientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn create_patient(
        &self,
        tenant: &TenantContext,
        request: CreatePatientRequest,
    ) -> Result<Patient, PatientError> {
        request.validate()?;
        debug!("Creating patient for clinic {}", tenant.clinic_id);

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            clinic_id: tenant.clinic_id,
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone_number: request.phone_number.trim().to_string(),
            sex: request.sex,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let patient = self.store.insert_patient(patient).await?;
        info!("Patient {} created", patient.id);
        Ok(patient)
    }

    pub async fn get_patient(&self, tenant: &TenantContext, patient_id: Uuid) -> Result<Patient, PatientError> {
        let patient = self
            .store
            .get_patient(patient_id)
            .await?
            .ok_or(PatientError::NotFound)?;
        tenant.ensure_same_clinic("patient", patient.clinic_id)?;
        Ok(patient)
    }

    pub async fn search_patients(
        &self,
        tenant: &TenantContext,
        query: PatientSearchQuery,
    ) -> Result<Vec<Patient>, PatientError> {
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        Ok(self.store.list_patients(tenant.clinic_id, search).await?)
    }

    pub async fn update_patient(
        &self,
        tenant: &TenantContext,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        request.validate()?;
        let current = self.get_patient(tenant, patient_id).await?;

        let patient = self
            .store
            .update_patient(Patient {
                name: request.name.trim().to_string(),
                email: request.email.trim().to_string(),
                phone_number: request.phone_number.trim().to_string(),
                sex: request.sex,
                updated_at: Utc::now(),
                ..current
            })
            .await?;

        info!("Patient {} updated", patient.id);
        Ok(patient)
    }

    pub async fn delete_patient(&self, tenant: &TenantContext, patient_id: Uuid) -> Result<(), PatientError> {
        self.get_patient(tenant, patient_id).await?;

        if !self.store.soft_delete_patient(patient_id, Utc::now()).await? {
            return Err(PatientError::NotFound);
        }
        info!("Patient {} deleted", patient_id);
        Ok(())
    }
}
