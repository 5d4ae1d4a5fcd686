use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::clinic::{Appointment, Clinic, Doctor, Patient};

use crate::store::{AppointmentFilter, ClinicStore, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    clinics: HashMap<Uuid, Clinic>,
    doctors: HashMap<Uuid, Doctor>,
    patients: HashMap<Uuid, Patient>,
    appointments: HashMap<Uuid, Appointment>,
}

impl Tables {
    fn overlapping_appointment(&self, candidate: &Appointment) -> Option<&Appointment> {
        self.appointments.values().find(|existing| {
            existing.id != candidate.id
                && existing.doctor_id == candidate.doctor_id
                && !existing.is_deleted()
                && existing.overlaps(candidate.date, candidate.end_date)
        })
    }
}

/// Process-local store used for development and tests.
///
/// Writes take the table lock for the whole check-and-insert, so the
/// no-overlap rule holds under concurrent bookings the same way the
/// Postgres exclusion constraint does.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn live<T: Clone>(row: Option<&T>, deleted_at: impl Fn(&T) -> Option<DateTime<Utc>>) -> Option<T> {
    row.filter(|r| deleted_at(r).is_none()).cloned()
}

#[async_trait]
impl ClinicStore for InMemoryStore {
    async fn insert_clinic(&self, clinic: Clinic) -> StoreResult<Clinic> {
        let mut tables = self.tables.write().await;
        tables.clinics.insert(clinic.id, clinic.clone());
        Ok(clinic)
    }

    async fn get_clinic(&self, id: Uuid) -> StoreResult<Option<Clinic>> {
        Ok(self.tables.read().await.clinics.get(&id).cloned())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        let mut tables = self.tables.write().await;
        tables.doctors.insert(doctor.id, doctor.clone());
        Ok(doctor)
    }

    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        let mut tables = self.tables.write().await;
        match tables.doctors.get_mut(&doctor.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                *existing = doctor.clone();
                Ok(doctor)
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn get_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>> {
        Ok(live(self.tables.read().await.doctors.get(&id), |d| d.deleted_at))
    }

    async fn list_doctors(&self, clinic_id: Uuid) -> StoreResult<Vec<Doctor>> {
        let tables = self.tables.read().await;
        let mut doctors: Vec<Doctor> = tables
            .doctors
            .values()
            .filter(|d| d.clinic_id == clinic_id && d.deleted_at.is_none())
            .cloned()
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    async fn soft_delete_doctor(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.doctors.get_mut(&id) {
            Some(doctor) if doctor.deleted_at.is_none() => {
                doctor.deleted_at = Some(at);
                true
            }
            _ => false,
        })
    }

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient> {
        let mut tables = self.tables.write().await;
        tables.patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn update_patient(&self, patient: Patient) -> StoreResult<Patient> {
        let mut tables = self.tables.write().await;
        match tables.patients.get_mut(&patient.id) {
            Some(existing) if existing.deleted_at.is_none() => {
                *existing = patient.clone();
                Ok(patient)
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn get_patient(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        Ok(live(self.tables.read().await.patients.get(&id), |p| p.deleted_at))
    }

    async fn list_patients(&self, clinic_id: Uuid, search: Option<&str>) -> StoreResult<Vec<Patient>> {
        let needle = search.map(str::to_lowercase);
        let tables = self.tables.read().await;
        let mut patients: Vec<Patient> = tables
            .patients
            .values()
            .filter(|p| p.clinic_id == clinic_id && p.deleted_at.is_none())
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |n| p.name.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        patients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(patients)
    }

    async fn soft_delete_patient(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.patients.get_mut(&id) {
            Some(patient) if patient.deleted_at.is_none() => {
                patient.deleted_at = Some(at);
                true
            }
            _ => false,
        })
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.overlapping_appointment(&appointment) {
            debug!("Rejecting insert, overlaps appointment {}", existing.id);
            return Err(StoreError::Constraint(format!(
                "appointment overlaps existing appointment {}",
                existing.id
            )));
        }
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;
        let is_live = tables
            .appointments
            .get(&appointment.id)
            .is_some_and(|a| !a.is_deleted());
        if !is_live {
            return Err(StoreError::NotFound);
        }
        if let Some(existing) = tables.overlapping_appointment(&appointment) {
            return Err(StoreError::Constraint(format!(
                "appointment overlaps existing appointment {}",
                existing.id
            )));
        }
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(live(self.tables.read().await.appointments.get(&id), |a| a.deleted_at))
    }

    async fn list_appointments(&self, clinic_id: Uuid, filter: AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.clinic_id == clinic_id && !a.is_deleted() && filter.matches(a))
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.date);
        Ok(appointments)
    }

    async fn doctor_appointments_overlapping(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_appointment_id: Option<Uuid>,
    ) -> StoreResult<Vec<Appointment>> {
        let tables = self.tables.read().await;
        let mut appointments: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| {
                a.doctor_id == doctor_id
                    && !a.is_deleted()
                    && Some(a.id) != exclude_appointment_id
                    && a.overlaps(start, end)
            })
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.date);
        Ok(appointments)
    }

    async fn soft_delete_appointment(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match tables.appointments.get_mut(&id) {
            Some(appointment) if !appointment.is_deleted() => {
                appointment.deleted_at = Some(at);
                true
            }
            _ => false,
        })
    }
}
