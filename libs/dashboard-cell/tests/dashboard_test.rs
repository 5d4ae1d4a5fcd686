use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use dashboard_cell::models::{DashboardError, DashboardQuery};
use dashboard_cell::router::dashboard_routes;
use dashboard_cell::services::DashboardService;
use shared_database::ClinicStore;
use shared_utils::extractor::TenantContext;
use shared_utils::test_utils::{Fixtures, JwtTestUtils, TestConfig, TestUser};

#[tokio::test]
async fn test_dashboard_totals_and_dense_series() {
    let config = TestConfig::default();
    let (state, store) = config.memory_state();
    let clinic = store.insert_clinic(Fixtures::clinic("Sorriso")).await.unwrap();
    let tenant = TenantContext::new("staff", clinic.id);

    let ana = store
        .insert_doctor(Fixtures::doctor(clinic.id, "Dr. Ana", "Orthodontics", 25000))
        .await
        .unwrap();
    let bia = store
        .insert_doctor(Fixtures::doctor(clinic.id, "Dr. Bia", "Endodontics", 18000))
        .await
        .unwrap();
    let maria = store.insert_patient(Fixtures::patient(clinic.id, "Maria")).await.unwrap();
    store.insert_patient(Fixtures::patient(clinic.id, "Joao")).await.unwrap();

    let monday = Fixtures::monday();
    store
        .insert_appointment(Fixtures::appointment(&ana, &maria, Fixtures::at(monday, "10:00"), 30))
        .await
        .unwrap();
    store
        .insert_appointment(Fixtures::appointment(&ana, &maria, Fixtures::at(monday + Duration::days(2), "10:00"), 30))
        .await
        .unwrap();
    let dropped = store
        .insert_appointment(Fixtures::appointment(&bia, &maria, Fixtures::at(monday, "11:00"), 30))
        .await
        .unwrap();
    store.soft_delete_appointment(dropped.id, Utc::now()).await.unwrap();
    // Outside the range.
    store
        .insert_appointment(Fixtures::appointment(&bia, &maria, Fixtures::at(monday + Duration::days(7), "11:00"), 30))
        .await
        .unwrap();

    let summary = DashboardService::new(&state)
        .get_dashboard(
            &tenant,
            DashboardQuery {
                from: monday,
                to: monday + Duration::days(4),
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.total_revenue_in_cents, 50000);
    assert_eq!(summary.total_appointments, 2);
    assert_eq!(summary.total_patients, 2);
    assert_eq!(summary.total_doctors, 2);
    assert_eq!(summary.daily.len(), 5);
    assert_eq!(summary.daily[0].appointments, 1);
    assert_eq!(summary.daily[1].appointments, 0);
    assert_eq!(summary.daily[2].revenue_in_cents, 25000);
    assert_eq!(summary.top_doctors.len(), 1);
    assert_eq!(summary.top_doctors[0].doctor_id, ana.id);
    assert_eq!(summary.top_specialties[0].specialty, "Orthodontics");
}

#[tokio::test]
async fn test_dashboard_is_scoped_to_caller_clinic() {
    let config = TestConfig::default();
    let (state, store) = config.memory_state();
    let ours = store.insert_clinic(Fixtures::clinic("Ours")).await.unwrap();
    let theirs = store.insert_clinic(Fixtures::clinic("Theirs")).await.unwrap();

    let doctor = store
        .insert_doctor(Fixtures::doctor(theirs.id, "Dr. Zed", "Surgery", 90000))
        .await
        .unwrap();
    let patient = store.insert_patient(Fixtures::patient(theirs.id, "Other")).await.unwrap();
    store
        .insert_appointment(Fixtures::appointment(&doctor, &patient, Fixtures::at(Fixtures::monday(), "09:00"), 60))
        .await
        .unwrap();

    let summary = DashboardService::new(&state)
        .get_dashboard(
            &TenantContext::new("staff", ours.id),
            DashboardQuery {
                from: Fixtures::monday(),
                to: Fixtures::monday(),
            },
        )
        .await
        .unwrap();

    assert_eq!(summary.total_appointments, 0);
    assert_eq!(summary.total_doctors, 0);
    assert_eq!(summary.daily.len(), 1);
    assert!(summary.today_appointments.is_empty());
}

#[tokio::test]
async fn test_dashboard_rejects_bad_ranges() {
    let (state, _) = TestConfig::default().memory_state();
    let tenant = TenantContext::new("staff", Uuid::new_v4());
    let service = DashboardService::new(&state);
    let from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    let reversed = service
        .get_dashboard(&tenant, DashboardQuery { from, to: from - Duration::days(1) })
        .await;
    assert_matches!(reversed, Err(DashboardError::ValidationError(_)));

    let too_long = service
        .get_dashboard(&tenant, DashboardQuery { from, to: from + Duration::days(400) })
        .await;
    assert_matches!(too_long, Err(DashboardError::ValidationError(_)));

    let last: NaiveDate = "+262142-12-31".parse().unwrap();
    let end_of_calendar = service
        .get_dashboard(&tenant, DashboardQuery { from: last - Duration::days(6), to: last })
        .await;
    assert_matches!(end_of_calendar, Err(DashboardError::ValidationError(_)));
}

#[tokio::test]
async fn test_dashboard_endpoint() {
    let config = TestConfig::default();
    let (state, store) = config.memory_state();
    let clinic = store.insert_clinic(Fixtures::clinic("Sorriso")).await.unwrap();
    let user = TestUser::staff("staff@example.com", clinic.id);
    let app = dashboard_routes(state);

    let request = Request::builder()
        .uri("/?from=2025-01-01&to=2025-01-31")
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["daily"].as_array().unwrap().len(), 31);
    assert_eq!(json["total_revenue_in_cents"], 0);

    let request = Request::builder()
        .uri("/?from=2025-02-01&to=2025-01-01")
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
