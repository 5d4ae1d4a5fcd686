pub mod memory;
pub mod state;
pub mod store;
pub mod supabase;
pub mod supabase_store;

pub use memory::InMemoryStore;
pub use state::AppState;
pub use store::{AppointmentFilter, ClinicStore, StoreError, StoreResult};
pub use supabase::SupabaseClient;
pub use supabase_store::SupabaseStore;
