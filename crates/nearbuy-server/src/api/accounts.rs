use axum::{extract::State, http::StatusCode, Extension, Json};
use nearbuy_core::validation::{is_valid_email, is_valid_password, is_valid_phone};
use nearbuy_db::{NewUser, UserRow};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password};
use crate::middleware::RequestId;

use super::users::UserItem;
use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RegisterRequest {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AuthPayload {
    pub token: String,
    pub user: UserItem,
}

fn validate_registration(req_id: &str, body: &RegisterRequest) -> Result<(), ApiError> {
    if !is_valid_email(body.email.trim()) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "email address is not valid",
        ));
    }
    if !is_valid_password(&body.password) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "password must be between 8 and 128 characters",
        ));
    }
    if let Some(phone) = body.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        if !is_valid_phone(phone) {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                "phone must be a 10-digit Indian mobile number",
            ));
        }
    }
    Ok(())
}

fn issue_payload(state: &AppState, req_id: &str, user: UserRow) -> Result<AuthPayload, ApiError> {
    let token = state.auth.tokens.issue(user.public_id).map_err(|e| {
        tracing::error!(error = %e, "failed to issue token");
        ApiError::new(req_id, "internal_error", "failed to issue token")
    })?;

    Ok(AuthPayload {
        token,
        user: UserItem::from(user),
    })
}

pub(super) async fn register(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthPayload>>), ApiError> {
    validate_registration(&req_id.0, &body)?;

    let password_hash = hash_password(&body.password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to register user")
    })?;

    let user = nearbuy_db::create_user(
        &state.pool,
        NewUser {
            name: body.name.as_deref().unwrap_or_default(),
            email: &body.email,
            password_hash: &password_hash,
            phone: body.phone.as_deref(),
        },
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            ApiError::new(
                req_id.0.clone(),
                "conflict",
                "an account with this email or phone already exists",
            )
        } else {
            map_db_error(req_id.0.clone(), &e)
        }
    })?;

    tracing::info!(user_id = %user.public_id, "registered user");
    let payload = issue_payload(&state, &req_id.0, user)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(payload, req_id.0)),
    ))
}

pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthPayload>>, ApiError> {
    let user = nearbuy_db::get_user_by_email(&state.pool, &body.email)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let Some(user) = user.filter(|u| verify_password(&body.password, &u.password_hash)) else {
        return Err(ApiError::new(
            req_id.0,
            "unauthorized",
            "invalid credentials",
        ));
    };

    let payload = issue_payload(&state, &req_id.0, user)?;
    Ok(Json(ApiResponse::new(payload, req_id.0)))
}
