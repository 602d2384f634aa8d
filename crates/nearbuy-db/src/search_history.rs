use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchHistoryRow {
    pub id: i64,
    pub search_item: String,
    pub searched_at: DateTime<Utc>,
}

/// Appends a search term to a user's history. Blank terms are ignored.
///
/// Returns `true` if a row was written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn record_search(pool: &PgPool, user_id: i64, term: &str) -> Result<bool, DbError> {
    let term = term.trim();
    if term.is_empty() {
        return Ok(false);
    }

    sqlx::query("INSERT INTO search_history (user_id, search_item) VALUES ($1, $2)")
        .bind(user_id)
        .bind(term)
        .execute(pool)
        .await?;

    Ok(true)
}

/// Returns a user's most recent searches, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_searches(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<SearchHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, SearchHistoryRow>(
        "SELECT id, search_item, searched_at \
         FROM search_history \
         WHERE user_id = $1 \
         ORDER BY searched_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
