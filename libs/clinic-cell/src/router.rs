use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn clinic_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::create_clinic))
        .route("/current", get(handlers::get_current_clinic))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
