use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::clinic::{Appointment, Clinic, Doctor, Patient};

use crate::store::{AppointmentFilter, ClinicStore, StoreError, StoreResult};
use crate::supabase::{SupabaseApiError, SupabaseClient};

const RETURN_REPRESENTATION: (&str, &str) = ("Prefer", "return=representation");

/// PostgREST-backed store over the Supabase REST API.
pub struct SupabaseStore {
    client: SupabaseClient,
}

fn timestamp(at: DateTime<Utc>) -> String {
    urlencoding::encode(&at.to_rfc3339()).into_owned()
}

fn store_error(err: anyhow::Error) -> StoreError {
    match err.downcast_ref::<SupabaseApiError>() {
        // 23P01 exclusion_violation and 23505 unique_violation surface as 409.
        Some(api) if api.status == 409 => StoreError::Constraint(api.body.clone()),
        Some(api) if api.status == 404 => StoreError::NotFound,
        _ => {
            error!("Store request failed: {}", err);
            StoreError::Backend(err.to_string())
        }
    }
}

fn to_body<T: Serialize>(row: &T) -> StoreResult<Value> {
    serde_json::to_value(row).map_err(|e| StoreError::Backend(e.to_string()))
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Vec<T>> {
        self.client
            .request(Method::GET, path, Some(self.client.anon_key()), None)
            .await
            .map_err(store_error)
    }

    async fn select_one<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Option<T>> {
        Ok(self.select(path).await?.into_iter().next())
    }

    async fn write<T: DeserializeOwned>(&self, method: Method, path: &str, body: Value) -> StoreResult<Vec<T>> {
        self.client
            .request_with_headers(
                method,
                path,
                Some(self.client.anon_key()),
                Some(body),
                &[RETURN_REPRESENTATION],
            )
            .await
            .map_err(store_error)
    }

    async fn insert<T: DeserializeOwned + Serialize>(&self, table: &str, row: &T) -> StoreResult<T> {
        let path = format!("/rest/v1/{}", table);
        self.write::<T>(Method::POST, &path, to_body(row)?)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("insert into {} returned no rows", table)))
    }

    async fn update<T: DeserializeOwned + Serialize>(&self, table: &str, id: Uuid, row: &T) -> StoreResult<T> {
        let path = format!("/rest/v1/{}?id=eq.{}&deleted_at=is.null", table, id);
        self.write::<T>(Method::PATCH, &path, to_body(row)?)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    async fn soft_delete(&self, table: &str, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let path = format!("/rest/v1/{}?id=eq.{}&deleted_at=is.null", table, id);
        let rows: Vec<Value> = self
            .write(Method::PATCH, &path, json!({ "deleted_at": at, "updated_at": at }))
            .await?;
        debug!("Soft deleted {} row(s) from {}", rows.len(), table);
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl ClinicStore for SupabaseStore {
    async fn insert_clinic(&self, clinic: Clinic) -> StoreResult<Clinic> {
        self.insert("clinics", &clinic).await
    }

    async fn get_clinic(&self, id: Uuid) -> StoreResult<Option<Clinic>> {
        self.select_one(&format!("/rest/v1/clinics?id=eq.{}", id)).await
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.insert("doctors", &doctor).await
    }

    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.update("doctors", doctor.id, &doctor).await
    }

    async fn get_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>> {
        self.select_one(&format!("/rest/v1/doctors?id=eq.{}&deleted_at=is.null", id))
            .await
    }

    async fn list_doctors(&self, clinic_id: Uuid) -> StoreResult<Vec<Doctor>> {
        self.select(&format!(
            "/rest/v1/doctors?clinic_id=eq.{}&deleted_at=is.null&order=name.asc",
            clinic_id
        ))
        .await
    }

    async fn soft_delete_doctor(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        self.soft_delete("doctors", id, at).await
    }

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient> {
        self.insert("patients", &patient).await
    }

    async fn update_patient(&self, patient: Patient) -> StoreResult<Patient> {
        self.update("patients", patient.id, &patient).await
    }

    async fn get_patient(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        self.select_one(&format!("/rest/v1/patients?id=eq.{}&deleted_at=is.null", id))
            .await
    }

    async fn list_patients(&self, clinic_id: Uuid, search: Option<&str>) -> StoreResult<Vec<Patient>> {
        let mut path = format!(
            "/rest/v1/patients?clinic_id=eq.{}&deleted_at=is.null&order=name.asc",
            clinic_id
        );
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            path.push_str(&format!("&name=ilike.{}", urlencoding::encode(&format!("*{}*", term))));
        }
        self.select(&path).await
    }

    async fn soft_delete_patient(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        self.soft_delete("patients", id, at).await
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        self.insert("appointments", &appointment).await
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        self.update("appointments", appointment.id, &appointment).await
    }

    async fn get_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        self.select_one(&format!("/rest/v1/appointments?id=eq.{}&deleted_at=is.null", id))
            .await
    }

    async fn list_appointments(&self, clinic_id: Uuid, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let mut path = format!(
            "/rest/v1/appointments?clinic_id=eq.{}&deleted_at=is.null",
            clinic_id
        );
        if let Some(from) = filter.from {
            path.push_str(&format!("&date=gte.{}", timestamp(from)));
        }
        if let Some(to) = filter.to {
            path.push_str(&format!("&date=lt.{}", timestamp(to)));
        }
        if let Some(doctor_id) = filter.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", doctor_id));
        }
        path.push_str("&order=date.asc");
        self.select(&path).await
    }

    async fn doctor_appointments_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> StoreResult<Vec<Appointment>> {
        // s1 < e2 && s2 < e1
        let mut path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&deleted_at=is.null&date=lt.{}&end_date=gt.{}",
            doctor_id,
            timestamp(end),
            timestamp(start)
        );
        if let Some(exclude_id) = exclude_appointment_id {
            path.push_str(&format!("&id=neq.{}", exclude_id));
        }
        path.push_str("&order=date.asc");
        self.select(&path).await
    }

    async fn soft_delete_appointment(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        self.soft_delete("appointments", id, at).await
    }
}
