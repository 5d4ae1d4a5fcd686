use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::router::appointment_routes;
use shared_database::ClinicStore;
use shared_models::clinic::{Doctor, Patient};
use shared_utils::test_utils::{Fixtures, JwtTestUtils, TestConfig, TestUser};

struct TestApp {
    app: Router,
    config: TestConfig,
    user: TestUser,
    doctor: Doctor,
    patient: Patient,
}

async fn create_test_app() -> TestApp {
    let config = TestConfig::default();
    let (state, store) = config.memory_state();
    let clinic = store.insert_clinic(Fixtures::clinic("Sorriso")).await.unwrap();
    let doctor = store
        .insert_doctor(Fixtures::doctor(clinic.id, "Dr. Ana", "Orthodontics", 25000))
        .await
        .unwrap();
    let patient = store.insert_patient(Fixtures::patient(clinic.id, "Maria")).await.unwrap();
    TestApp {
        app: appointment_routes(state),
        user: TestUser::staff("staff@example.com", clinic.id),
        config,
        doctor,
        patient,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", JwtTestUtils::bearer(&self.user, &self.config));
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn booking(&self, date: &str, start: &str, end: &str) -> Value {
        json!({
            "doctor_id": self.doctor.id,
            "patient_id": self.patient.id,
            "date": date,
            "start_time": start,
            "end_time": end
        })
    }
}

#[tokio::test]
async fn test_book_appointment_created() {
    let t = create_test_app().await;

    let (status, body) = t.send("POST", "/", Some(t.booking("2025-01-06", "10:00", "10:30"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment_price_in_cents"], 25000);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["date"], "2025-01-06T10:00:00Z");
}

#[tokio::test]
async fn test_error_categories_map_to_status_codes() {
    let t = create_test_app().await;
    t.send("POST", "/", Some(t.booking("2025-01-06", "10:00", "10:30"))).await;

    let (status, body) = t.send("POST", "/", Some(t.booking("2025-01-06", "10:15", "10:45"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = t.send("POST", "/", Some(t.booking("2025-01-11", "10:00", "10:30"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.send("POST", "/", Some(t.booking("2025-01-06", "25:00", "25:30"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.send("GET", &format!("/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t.send("GET", "/?to=%2B262142-12-31", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reschedule_status_and_delete_flow() {
    let t = create_test_app().await;
    let (_, created) = t.send("POST", "/", Some(t.booking("2025-01-06", "10:00", "10:30"))).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, moved) = t
        .send(
            "PATCH",
            &format!("/{}/reschedule", id),
            Some(json!({ "date": "2025-01-07T14:00:00Z", "end_date": "2025-01-07T15:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["end_date"], "2025-01-07T15:00:00Z");

    let (status, _) = t
        .send("PATCH", &format!("/{}/reschedule", id), Some(json!({ "date": "2025-01-07T14:00:00Z" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, confirmed) = t
        .send("PATCH", &format!("/{}/status", id), Some(json!({ "status": "confirmed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    let (status, _) = t.send("DELETE", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t.send("DELETE", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calendar_listing_and_conflict_check() {
    let t = create_test_app().await;
    t.send("POST", "/", Some(t.booking("2025-01-06", "10:00", "10:30"))).await;
    t.send("POST", "/", Some(t.booking("2025-01-08", "10:00", "10:30"))).await;

    let (status, listed) = t.send("GET", "/?from=2025-01-06&to=2025-01-07", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);

    let uri = format!(
        "/conflicts/check?doctor_id={}&date=2025-01-06T10:00:00Z&end_date=2025-01-06T11:00:00Z",
        t.doctor.id
    );
    let (status, report) = t.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["has_conflict"], true);
    assert_eq!(report["within_availability"], true);
    assert_eq!(report["conflicting_appointments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_other_clinic_cannot_touch_appointment() {
    let t = create_test_app().await;
    let (_, created) = t.send("POST", "/", Some(t.booking("2025-01-06", "10:00", "10:30"))).await;
    let id = created["id"].as_str().unwrap().to_string();

    let intruder = TestApp {
        user: TestUser::staff("intruder@example.com", Uuid::new_v4()),
        ..t
    };

    let (status, _) = intruder.send("DELETE", &format!("/{}", id), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = intruder
        .send("POST", "/", Some(intruder.booking("2025-01-06", "11:00", "11:30")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let t = create_test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(t.booking("2025-01-06", "10:00", "10:30").to_string()))
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
