use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use assert_matches::assert_matches;
use chrono::NaiveDate;

use doctor_cell::models::DoctorError;
use doctor_cell::router::doctor_routes;
use doctor_cell::services::AvailabilityService;
use shared_database::{AppState, AppointmentFilter, ClinicStore};
use shared_utils::extractor::TenantContext;
use shared_utils::test_utils::{Fixtures, JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(state: AppState) -> Router {
    doctor_routes(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_available_times_over_postgrest() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(mock_server.uri());
    let clinic_id = Uuid::new_v4();
    let user = TestUser::staff("staff@example.com", clinic_id);
    let doctor = Fixtures::doctor(clinic_id, "Dr. Ana", "Orthodontics", 25000);
    let patient = Fixtures::patient(clinic_id, "Maria");
    let monday = Fixtures::monday();
    let booked = Fixtures::appointment(&doctor, &patient, Fixtures::at(monday, "09:30"), 60);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor.id)))
        .and(query_param("deleted_at", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSupabaseResponses::rows(&[doctor.clone()])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .and(query_param("date", "lt.2025-01-07T00:00:00+00:00"))
        .and(query_param("end_date", "gt.2025-01-06T00:00:00+00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockSupabaseResponses::rows(&[booked])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .uri(format!("/{}/available-times?date=2025-01-06", doctor.id))
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(config.supabase_state()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let times = body_json(response).await;
    let taken: Vec<&str> = times
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["available"] == false)
        .map(|t| t["value"].as_str().unwrap())
        .collect();
    assert_eq!(taken, vec!["09:30", "10:00"]);
}

#[tokio::test]
async fn test_available_times_on_day_off_is_empty() {
    let config = TestConfig::default();
    let (state, store) = config.memory_state();
    let clinic_id = Uuid::new_v4();
    let doctor = store
        .insert_doctor(Fixtures::doctor(clinic_id, "Dr. Ana", "Orthodontics", 25000))
        .await
        .unwrap();
    let user = TestUser::staff("staff@example.com", clinic_id);

    let request = Request::builder()
        .uri(format!("/{}/available-times?date=2025-01-11", doctor.id))
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_available_times_requires_date() {
    let config = TestConfig::default();
    let (state, _) = config.memory_state();
    let user = TestUser::staff("staff@example.com", Uuid::new_v4());

    let request = Request::builder()
        .uri(format!("/{}/available-times", Uuid::new_v4()))
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_doctor_unauthorized() {
    let (state, _) = TestConfig::default().memory_state();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "Dr. Ana" }).to_string()))
        .unwrap();

    let response = create_test_app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let config = TestConfig::default();
    let (state, _) = config.memory_state();
    let user = TestUser::staff("staff@example.com", Uuid::new_v4());
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let request = Request::builder()
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_crud_roundtrip_through_router() {
    let config = TestConfig::default();
    let (state, _) = config.memory_state();
    let user = TestUser::staff("staff@example.com", Uuid::new_v4());
    let app = create_test_app(state);

    let body = json!({
        "name": "Dr. Ana Lima",
        "specialty": "Endodontics",
        "appointment_price_in_cents": 18000,
        "color": "#f59e0b",
        "available_from_week_day": 5,
        "available_to_week_day": 1,
        "available_from_time": "08:00",
        "available_to_time": "12:00"
    });
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let doctor_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Friday through Monday wraps the week; Sunday is covered.
    let request = Request::builder()
        .uri(format!("/{}/available-times?date=2025-01-05", doctor_id))
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 8);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/{}", doctor_id))
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri(format!("/{}", doctor_id))
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_available_times_is_idempotent() {
    let (state, store) = TestConfig::default().memory_state();
    let clinic = store.insert_clinic(Fixtures::clinic("Clinic")).await.unwrap();
    let doctor = store
        .insert_doctor(Fixtures::doctor(clinic.id, "Dr. Ana", "Orthodontics", 25000))
        .await
        .unwrap();
    let patient = store.insert_patient(Fixtures::patient(clinic.id, "Maria")).await.unwrap();
    let monday = Fixtures::monday();
    store
        .insert_appointment(Fixtures::appointment(&doctor, &patient, Fixtures::at(monday, "14:00"), 60))
        .await
        .unwrap();
    let tenant = TenantContext::new("user-1", clinic.id);
    let service = AvailabilityService::new(&state);

    let first = service.get_available_times(&tenant, doctor.id, monday).await.unwrap();
    let second = service.get_available_times(&tenant, doctor.id, monday).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.iter().filter(|t| !t.available).count(), 2);
    let stored = store.list_appointments(clinic.id, AppointmentFilter::default()).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_available_times_on_last_calendar_day_is_a_validation_error() {
    let (state, store) = TestConfig::default().memory_state();
    let clinic = store.insert_clinic(Fixtures::clinic("Clinic")).await.unwrap();
    let mut doctor = Fixtures::doctor(clinic.id, "Dr. Ana", "Orthodontics", 25000);
    doctor.availability.from_weekday = 0;
    doctor.availability.to_weekday = 6;
    let doctor = store.insert_doctor(doctor).await.unwrap();
    let tenant = TenantContext::new("user-1", clinic.id);

    let last: NaiveDate = "+262142-12-31".parse().unwrap();
    let result = AvailabilityService::new(&state)
        .get_available_times(&tenant, doctor.id, last)
        .await;
    assert_matches!(result, Err(DoctorError::ValidationError(_)));
}
