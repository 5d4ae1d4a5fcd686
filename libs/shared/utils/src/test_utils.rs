use std::sync::Arc;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{AppState, ClinicStore, InMemoryStore};
use shared_models::auth::User;
use shared_models::clinic::{Appointment, AppointmentStatus, Clinic, Doctor, Patient, PatientSex};
use shared_models::schedule::{AvailabilityWindow, ClinicClock, TimeOfDay};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub slot_minutes: u32,
    pub clinic_utc_offset_minutes: i32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            slot_minutes: 30,
            clinic_utc_offset_minutes: 0,
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            store_backend: StoreBackend::Supabase,
            slot_minutes: self.slot_minutes,
            clinic_utc_offset_minutes: self.clinic_utc_offset_minutes,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    /// State backed by a fresh in-memory store; the store handle is returned for seeding.
    pub fn memory_state(&self) -> (AppState, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let config = AppConfig {
            store_backend: StoreBackend::Memory,
            ..self.to_app_config()
        };
        let state = AppState::new(Arc::new(config), store.clone() as Arc<dyn ClinicStore>);
        (state, store)
    }

    /// State backed by the PostgREST store pointed at `supabase_url`.
    pub fn supabase_state(&self) -> AppState {
        AppState::from_config(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
    pub clinic_id: Option<Uuid>,
}

impl TestUser {
    pub fn new(email: &str, role: &str, clinic_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
            clinic_id,
        }
    }

    pub fn staff(email: &str, clinic_id: Uuid) -> Self {
        Self::new(email, "authenticated", Some(clinic_id))
    }

    pub fn without_clinic(email: &str) -> Self {
        Self::new(email, "authenticated", None)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            clinic_id: self.clinic_id,
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let app_metadata = match user.clinic_id {
            Some(clinic_id) => json!({ "clinic_id": clinic_id }),
            None => json!({}),
        };

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "app_metadata": app_metadata,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    pub fn bearer(user: &TestUser, config: &TestConfig) -> String {
        format!("Bearer {}", Self::create_test_token(user, &config.jwt_secret, Some(24)))
    }
}

/// Entity builders with realistic defaults.
pub struct Fixtures;

impl Fixtures {
    fn time(raw: &str) -> TimeOfDay {
        TimeOfDay::parse(raw).expect("fixture time")
    }

    /// 2025-01-06, a Monday.
    pub fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).expect("fixture date")
    }

    pub fn at(date: NaiveDate, time: &str) -> DateTime<Utc> {
        ClinicClock::utc().to_utc(date, Self::time(time)).expect("fixture instant")
    }

    pub fn clinic(name: &str) -> Clinic {
        let now = Utc::now();
        Clinic {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn weekday_window(from: &str, to: &str) -> AvailabilityWindow {
        AvailabilityWindow {
            from_weekday: 1,
            to_weekday: 5,
            from_time: Self::time(from),
            to_time: Self::time(to),
        }
    }

    /// Monday to Friday, 09:00 to 18:00.
    pub fn doctor(clinic_id: Uuid, name: &str, specialty: &str, price_in_cents: i64) -> Doctor {
        let now = Utc::now();
        Doctor {
            id: Uuid::new_v4(),
            clinic_id,
            name: name.to_string(),
            specialty: specialty.to_string(),
            appointment_price_in_cents: price_in_cents,
            color: Some("#3b82f6".to_string()),
            availability: Self::weekday_window("09:00", "18:00"),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn patient(clinic_id: Uuid, name: &str) -> Patient {
        let now = Utc::now();
        Patient {
            id: Uuid::new_v4(),
            clinic_id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            phone_number: "+5511999990000".to_string(),
            sex: PatientSex::Female,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn appointment(doctor: &Doctor, patient: &Patient, start: DateTime<Utc>, minutes: i64) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: Uuid::new_v4(),
            clinic_id: doctor.clinic_id,
            doctor_id: doctor.id,
            patient_id: patient.id,
            date: start,
            end_date: start + Duration::minutes(minutes),
            appointment_price_in_cents: doctor.appointment_price_in_cents,
            status: AppointmentStatus::Pending,
            budget_id: None,
            treatment_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn row<T: serde::Serialize>(entity: &T) -> serde_json::Value {
        serde_json::to_value(entity).expect("fixture serializes")
    }

    pub fn rows<T: serde::Serialize>(entities: &[T]) -> serde_json::Value {
        serde_json::Value::Array(entities.iter().map(Self::row).collect())
    }

    pub fn exclusion_violation() -> serde_json::Value {
        json!({
            "code": "23P01",
            "details": null,
            "hint": null,
            "message": "conflicting key value violates exclusion constraint \"appointments_no_overlap\""
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }
}
