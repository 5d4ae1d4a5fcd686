use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request},
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_value = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn extract_user(parts: &Parts) -> Result<User, AppError> {
    parts
        .extensions
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{resource} belongs to another clinic")]
pub struct ForeignTenant {
    pub resource: &'static str,
}

/// The clinic a request acts on, taken from the caller's token and never from the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub user_id: String,
    pub clinic_id: Uuid,
    pub role: Option<String>,
}

impl TenantContext {
    pub fn new(user_id: impl Into<String>, clinic_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            clinic_id,
            role: None,
        }
    }

    pub fn from_user(user: &User) -> Result<Self, AppError> {
        let clinic_id = user
            .clinic_id
            .ok_or_else(|| AppError::Forbidden("User is not assigned to a clinic".to_string()))?;
        Ok(Self {
            user_id: user.id.clone(),
            clinic_id,
            role: user.role.clone(),
        })
    }

    pub fn ensure_same_clinic(&self, resource: &'static str, owner: Uuid) -> Result<(), ForeignTenant> {
        if owner == self.clinic_id {
            Ok(())
        } else {
            debug!("User {} denied access to {} of clinic {}", self.user_id, resource, owner);
            Err(ForeignTenant { resource })
        }
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = extract_user(parts)?;
        TenantContext::from_user(&user)
    }
}
