use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StoreBackend};
use shared_models::schedule::ClinicClock;

use crate::memory::InMemoryStore;
use crate::store::ClinicStore;
use crate::supabase_store::SupabaseStore;

/// Shared router state: configuration plus the store every cell talks to.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ClinicStore>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn ClinicStore>) -> Self {
        Self { config, store }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let store: Arc<dyn ClinicStore> = match config.store_backend {
            StoreBackend::Supabase => {
                info!("Using PostgREST store at {}", config.supabase_url);
                Arc::new(SupabaseStore::new(&config))
            }
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Arc::new(InMemoryStore::new())
            }
        };
        Self::new(Arc::new(config), store)
    }

    pub fn clock(&self) -> ClinicClock {
        ClinicClock::new(self.config.clinic_utc_offset_minutes)
    }

    pub fn slot_minutes(&self) -> u32 {
        self.config.slot_minutes
    }
}
