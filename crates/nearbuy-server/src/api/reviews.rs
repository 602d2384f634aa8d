use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use nearbuy_core::validation::is_valid_rating;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::{AuthUser, RequestId};

use super::users::current_user;
use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CreateReviewRequest {
    pub product_id: i64,
    pub rating: f64,
    pub review_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedReview {
    pub id: i64,
    pub product_id: i64,
    pub user_name: String,
    pub rating: Decimal,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

/// Convert a validated rating to the one-decimal value stored in the database.
fn rating_decimal(req_id: &str, rating: f64) -> Result<Decimal, ApiError> {
    if !is_valid_rating(rating) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "rating must be between 1 and 5",
        ));
    }
    Decimal::try_from(rating)
        .map(|d| d.round_dp(1))
        .map_err(|_| ApiError::new(req_id, "validation_error", "rating is not a number"))
}

pub(super) async fn create_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedReview>>), ApiError> {
    let rating = rating_decimal(&req_id.0, body.rating)?;
    let user = current_user(&state, &req_id.0, auth).await?;

    let row = nearbuy_db::insert_review(
        &state.pool,
        user.id,
        body.product_id,
        rating,
        body.review_text.as_deref().unwrap_or_default(),
    )
    .await
    .map_err(|e| {
        if e.is_foreign_key_violation() {
            ApiError::new(req_id.0.clone(), "not_found", "product not found")
        } else {
            map_db_error(req_id.0.clone(), &e)
        }
    })?;

    tracing::info!(
        product_id = row.product_id,
        user_id = %auth.user_id,
        "review created"
    );

    let data = CreatedReview {
        id: row.id,
        product_id: row.product_id,
        user_name: row.user_name,
        rating: row.rating,
        review_text: row.review_text,
        created_at: row.created_at,
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::new(data, req_id.0))))
}
