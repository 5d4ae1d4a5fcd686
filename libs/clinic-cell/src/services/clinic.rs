use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{AppState, ClinicStore};
use shared_models::clinic::Clinic;
use shared_utils::extractor::TenantContext;

use crate::models::{ClinicError, CreateClinicRequest};

pub struct ClinicService {
    store: Arc<dyn ClinicStore>,
}

impl ClinicService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    /// Linking the creator to the new clinic happens in the auth provider,
    /// which stamps `clinic_id` into the user's app metadata.
    pub async fn create_clinic(&self, request: CreateClinicRequest) -> Result<Clinic, ClinicError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ClinicError::ValidationError("Clinic name is required".to_string()));
        }

        let now = Utc::now();
        let clinic = self
            .store
            .insert_clinic(Clinic {
                id: Uuid::new_v4(),
                name: name.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await?;

        info!("Clinic {} created", clinic.id);
        Ok(clinic)
    }

    pub async fn get_current_clinic(&self, tenant: &TenantContext) -> Result<Clinic, ClinicError> {
        debug!("Fetching clinic {}", tenant.clinic_id);
        self.store
            .get_clinic(tenant.clinic_id)
            .await?
            .ok_or(ClinicError::NotFound)
    }
}
