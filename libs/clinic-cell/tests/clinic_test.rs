use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use clinic_cell::router::clinic_routes;
use shared_database::ClinicStore;
use shared_utils::test_utils::{Fixtures, JwtTestUtils, TestConfig, TestUser};

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_create_clinic() {
    let config = TestConfig::default();
    let (state, store) = config.memory_state();
    let user = TestUser::without_clinic("owner@example.com");

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "  Sorriso Odontologia " }).to_string()))
        .unwrap();

    let response = clinic_routes(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["name"], "Sorriso Odontologia");
    let id = created["id"].as_str().unwrap().parse().unwrap();
    assert!(store.get_clinic(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_clinic_requires_name() {
    let config = TestConfig::default();
    let (state, _) = config.memory_state();
    let user = TestUser::without_clinic("owner@example.com");

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "name": "   " }).to_string()))
        .unwrap();

    let response = clinic_routes(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_current_clinic_comes_from_token() {
    let config = TestConfig::default();
    let (state, store) = config.memory_state();
    let clinic = store.insert_clinic(Fixtures::clinic("Clínica Norte")).await.unwrap();
    store.insert_clinic(Fixtures::clinic("Clínica Sul")).await.unwrap();
    let user = TestUser::staff("staff@example.com", clinic.id);

    let request = Request::builder()
        .uri("/current")
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();

    let response = clinic_routes(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Clínica Norte");
}

#[tokio::test]
async fn test_current_clinic_without_assignment_is_forbidden() {
    let config = TestConfig::default();
    let (state, _) = config.memory_state();
    let user = TestUser::without_clinic("new@example.com");

    let request = Request::builder()
        .uri("/current")
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();

    let response = clinic_routes(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (state, _) = TestConfig::default().memory_state();

    let request = Request::builder()
        .uri("/current")
        .body(Body::empty())
        .unwrap();

    let response = clinic_routes(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
