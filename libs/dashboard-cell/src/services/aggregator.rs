use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use shared_models::clinic::{Appointment, Doctor};
use shared_models::schedule::ClinicClock;

use crate::models::{DailyPoint, DashboardError, DashboardQuery, DoctorCount, SpecialtyCount, MAX_RANGE_DAYS};

pub const TOP_DOCTORS_LIMIT: usize = 10;

pub fn validate_range(query: &DashboardQuery) -> Result<(), DashboardError> {
    if query.from > query.to {
        return Err(DashboardError::ValidationError(
            "'from' must not be after 'to'".to_string(),
        ));
    }
    let days = (query.to - query.from).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(DashboardError::ValidationError(format!(
            "Dashboard range spans {} days, at most {} are allowed",
            days, MAX_RANGE_DAYS
        )));
    }
    Ok(())
}

/// Totals over the range. Deleted appointments never count.
pub fn revenue_and_count(appointments: &[Appointment]) -> (i64, u64) {
    appointments
        .iter()
        .filter(|a| !a.is_deleted())
        .fold((0, 0), |(revenue, count), a| {
            (revenue + a.appointment_price_in_cents, count + 1)
        })
}

/// One point per local day in `[from, to]`, zero where nothing was booked.
pub fn daily_series(
    query: &DashboardQuery,
    clock: &ClinicClock,
    appointments: &[Appointment],
) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, (u64, i64)> = BTreeMap::new();
    for appointment in appointments.iter().filter(|a| !a.is_deleted()) {
        let Some(date) = clock.local_date(appointment.date) else {
            continue;
        };
        let bucket = buckets.entry(date).or_default();
        bucket.0 += 1;
        bucket.1 += appointment.appointment_price_in_cents;
    }

    let days = (query.to - query.from).num_days();
    (0..=days)
        .map(|offset| {
            let date = query.from + Duration::days(offset);
            let (appointments, revenue_in_cents) = buckets.get(&date).copied().unwrap_or_default();
            DailyPoint {
                date,
                appointments,
                revenue_in_cents,
            }
        })
        .collect()
}

/// Appointments of doctors that are no longer live are left out of the ranking.
pub fn top_doctors(doctors: &[Doctor], appointments: &[Appointment]) -> Vec<DoctorCount> {
    let counts = count_by(appointments, |a| a.doctor_id);

    let mut ranked: Vec<DoctorCount> = doctors
        .iter()
        .filter_map(|doctor| {
            counts.get(&doctor.id).map(|&appointments| DoctorCount {
                doctor_id: doctor.id,
                name: doctor.name.clone(),
                specialty: doctor.specialty.clone(),
                appointments,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.appointments.cmp(&a.appointments).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_DOCTORS_LIMIT);
    ranked
}

pub fn top_specialties(doctors: &[Doctor], appointments: &[Appointment]) -> Vec<SpecialtyCount> {
    let specialty_of: HashMap<Uuid, &str> = doctors
        .iter()
        .map(|d| (d.id, d.specialty.as_str()))
        .collect();

    let mut counts: HashMap<&str, u64> = HashMap::new();
    for appointment in appointments.iter().filter(|a| !a.is_deleted()) {
        if let Some(specialty) = specialty_of.get(&appointment.doctor_id) {
            *counts.entry(*specialty).or_default() += 1;
        }
    }

    let mut ranked: Vec<SpecialtyCount> = counts
        .into_iter()
        .map(|(specialty, appointments)| SpecialtyCount {
            specialty: specialty.to_string(),
            appointments,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.appointments
            .cmp(&a.appointments)
            .then_with(|| a.specialty.cmp(&b.specialty))
    });
    ranked
}

fn count_by<K, F>(appointments: &[Appointment], key: F) -> HashMap<K, u64>
where
    K: std::hash::Hash + Eq,
    F: Fn(&Appointment) -> K,
{
    let mut counts = HashMap::new();
    for appointment in appointments.iter().filter(|a| !a.is_deleted()) {
        *counts.entry(key(appointment)).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::Fixtures;

    fn query(from: NaiveDate, to: NaiveDate) -> DashboardQuery {
        DashboardQuery { from, to }
    }

    #[test]
    fn range_rules() {
        let monday = Fixtures::monday();
        assert!(validate_range(&query(monday, monday)).is_ok());
        assert!(validate_range(&query(monday, monday - Duration::days(1))).is_err());
        assert!(validate_range(&query(monday, monday + Duration::days(365))).is_ok());
        assert!(validate_range(&query(monday, monday + Duration::days(366))).is_err());
    }

    #[test]
    fn daily_series_is_dense_and_zero_filled() {
        let clinic = Fixtures::clinic("Clinic");
        let doctor = Fixtures::doctor(clinic.id, "Dr. Ana", "Orthodontics", 25000);
        let patient = Fixtures::patient(clinic.id, "Maria");
        let monday = Fixtures::monday();
        let wednesday = monday + Duration::days(2);

        let appointments = vec![
            Fixtures::appointment(&doctor, &patient, Fixtures::at(wednesday, "09:00"), 30),
            Fixtures::appointment(&doctor, &patient, Fixtures::at(wednesday, "10:00"), 30),
        ];

        let series = daily_series(&query(monday, monday + Duration::days(6)), &ClinicClock::utc(), &appointments);
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, monday);
        assert_eq!(series[2].appointments, 2);
        assert_eq!(series[2].revenue_in_cents, 50000);
        assert_eq!(series.iter().map(|p| p.appointments).sum::<u64>(), 2);
    }

    #[test]
    fn daily_buckets_use_clinic_local_day() {
        let clinic = Fixtures::clinic("Clinic");
        let doctor = Fixtures::doctor(clinic.id, "Dr. Ana", "Orthodontics", 25000);
        let patient = Fixtures::patient(clinic.id, "Maria");
        let tuesday = Fixtures::monday() + Duration::days(1);

        // 01:00 UTC on Tuesday is still Monday evening at UTC-03:00.
        let late = Fixtures::appointment(&doctor, &patient, Fixtures::at(tuesday, "01:00"), 30);
        let series = daily_series(&query(Fixtures::monday(), tuesday), &ClinicClock::new(-180), &[late]);
        assert_eq!(series[0].appointments, 1);
        assert_eq!(series[1].appointments, 0);
    }

    #[test]
    fn rankings_sort_by_count_then_name() {
        let clinic = Fixtures::clinic("Clinic");
        let bia = Fixtures::doctor(clinic.id, "Dr. Bia", "Endodontics", 18000);
        let ana = Fixtures::doctor(clinic.id, "Dr. Ana", "Orthodontics", 25000);
        let caio = Fixtures::doctor(clinic.id, "Dr. Caio", "Endodontics", 15000);
        let patient = Fixtures::patient(clinic.id, "Maria");
        let monday = Fixtures::monday();

        let mut deleted = Fixtures::appointment(&caio, &patient, Fixtures::at(monday, "11:00"), 30);
        deleted.deleted_at = Some(chrono::Utc::now());
        let appointments = vec![
            Fixtures::appointment(&bia, &patient, Fixtures::at(monday, "09:00"), 30),
            Fixtures::appointment(&ana, &patient, Fixtures::at(monday, "09:00"), 30),
            Fixtures::appointment(&caio, &patient, Fixtures::at(monday, "10:00"), 30),
            Fixtures::appointment(&caio, &patient, Fixtures::at(monday, "10:30"), 30),
            deleted,
        ];
        let doctors = vec![bia.clone(), ana.clone(), caio.clone()];

        let names: Vec<(String, u64)> = top_doctors(&doctors, &appointments)
            .into_iter()
            .map(|d| (d.name, d.appointments))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Dr. Caio".to_string(), 2),
                ("Dr. Ana".to_string(), 1),
                ("Dr. Bia".to_string(), 1),
            ]
        );

        let specialties = top_specialties(&doctors, &appointments);
        assert_eq!(specialties[0].specialty, "Endodontics");
        assert_eq!(specialties[0].appointments, 3);
        assert_eq!(specialties[1].specialty, "Orthodontics");

        assert_eq!(revenue_and_count(&appointments), (18000 + 25000 + 30000, 4));
    }

    #[test]
    fn top_doctors_is_capped() {
        let clinic = Fixtures::clinic("Clinic");
        let patient = Fixtures::patient(clinic.id, "Maria");
        let doctors: Vec<Doctor> = (0..12)
            .map(|i| Fixtures::doctor(clinic.id, &format!("Dr. {:02}", i), "General", 10000))
            .collect();
        let appointments: Vec<Appointment> = doctors
            .iter()
            .map(|d| Fixtures::appointment(d, &patient, Fixtures::at(Fixtures::monday(), "09:00"), 30))
            .collect();

        let ranked = top_doctors(&doctors, &appointments);
        assert_eq!(ranked.len(), TOP_DOCTORS_LIMIT);
        assert_eq!(ranked[0].name, "Dr. 00");
    }
}
