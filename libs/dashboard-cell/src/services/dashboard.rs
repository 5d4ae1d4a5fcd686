use std::sync::Arc;

use tracing::{debug, info};

use shared_database::{AppState, AppointmentFilter, ClinicStore};
use shared_models::schedule::ClinicClock;
use shared_utils::extractor::TenantContext;

use crate::models::{DashboardError, DashboardQuery, DashboardSummary};
use crate::services::aggregator::{
    daily_series, revenue_and_count, top_doctors, top_specialties, validate_range,
};

pub struct DashboardService {
    store: Arc<dyn ClinicStore>,
    clock: ClinicClock,
}

impl DashboardService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            clock: state.clock(),
        }
    }

    pub async fn get_dashboard(
        &self,
        tenant: &TenantContext,
        query: DashboardQuery,
    ) -> Result<DashboardSummary, DashboardError> {
        validate_range(&query)?;
        debug!(
            "Building dashboard for clinic {} from {} to {}",
            tenant.clinic_id, query.from, query.to
        );

        let range = AppointmentFilter {
            from: Some(self.clock.day_bounds(query.from)?.0),
            to: Some(self.clock.day_bounds(query.to)?.1),
            doctor_id: None,
        };
        let appointments = self.store.list_appointments(tenant.clinic_id, range).await?;
        let doctors = self.store.list_doctors(tenant.clinic_id).await?;
        let patients = self.store.list_patients(tenant.clinic_id, None).await?;

        let (today_start, today_end) = self.clock.day_bounds(self.clock.today())?;
        let today = AppointmentFilter {
            from: Some(today_start),
            to: Some(today_end),
            doctor_id: None,
        };
        let today_appointments = self.store.list_appointments(tenant.clinic_id, today).await?;

        let (total_revenue_in_cents, total_appointments) = revenue_and_count(&appointments);
        let summary = DashboardSummary {
            from: query.from,
            to: query.to,
            total_revenue_in_cents,
            total_appointments,
            total_patients: patients.len() as u64,
            total_doctors: doctors.len() as u64,
            top_doctors: top_doctors(&doctors, &appointments),
            top_specialties: top_specialties(&doctors, &appointments),
            daily: daily_series(&query, &self.clock, &appointments),
            today_appointments,
        };

        info!(
            "Dashboard for clinic {}: {} appointments, {} cents",
            tenant.clinic_id, summary.total_appointments, summary.total_revenue_in_cents
        );
        Ok(summary)
    }
}
