use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use nearbuy_db::UserRow;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct UserItem {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserItem {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.public_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SearchHistoryItem {
    pub search_item: String,
    pub searched_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Load the row behind a verified token.
///
/// A token can outlive its user, so a missing row is a 401.
pub(super) async fn current_user(
    state: &AppState,
    req_id: &str,
    auth: AuthUser,
) -> Result<UserRow, ApiError> {
    nearbuy_db::get_user_by_id(&state.pool, auth.user_id)
        .await
        .map_err(|e| map_db_error(req_id.to_string(), &e))?
        .ok_or_else(|| ApiError::new(req_id, "unauthorized", "user no longer exists"))
}

pub(super) async fn get_me(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let user = current_user(&state, &req_id.0, auth).await?;
    Ok(Json(ApiResponse::new(UserItem::from(user), req_id.0)))
}

pub(super) async fn list_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<SearchHistoryItem>>>, ApiError> {
    let user = current_user(&state, &req_id.0, auth).await?;
    let rows = nearbuy_db::list_recent_searches(&state.pool, user.id, normalize_limit(params.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| SearchHistoryItem {
            search_item: row.search_item,
            searched_at: row.searched_at,
        })
        .collect();

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
