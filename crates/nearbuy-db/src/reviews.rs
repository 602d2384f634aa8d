use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A product review joined with the reviewer's display name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: i64,
    pub product_id: i64,
    pub user_name: String,
    pub rating: Decimal,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RatingSummary {
    pub review_count: i64,
    /// `None` when the product has no reviews.
    pub average_rating: Option<Decimal>,
}

/// Stores a review and returns it with the reviewer's name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails. An unknown product or user
/// surfaces as a foreign-key violation (see
/// [`DbError::is_foreign_key_violation`]); an out-of-range rating as a check
/// violation.
pub async fn insert_review(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
    rating: Decimal,
    review_text: &str,
) -> Result<ReviewRow, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "WITH inserted AS ( \
             INSERT INTO product_reviews (user_id, product_id, rating, review_text) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, product_id, rating, review_text, created_at \
         ) \
         SELECT i.id, i.product_id, u.name AS user_name, i.rating, i.review_text, i.created_at \
         FROM inserted i \
         JOIN users u ON u.id = i.user_id",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(rating)
    .bind(review_text.trim())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a product's reviews, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_reviews(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<ReviewRow>, DbError> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT r.id, r.product_id, u.name AS user_name, r.rating, r.review_text, r.created_at \
         FROM product_reviews r \
         JOIN users u ON u.id = r.user_id \
         WHERE r.product_id = $1 \
         ORDER BY r.created_at DESC, r.id DESC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the review count and average rating (two decimals) for a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_rating_summary(pool: &PgPool, product_id: i64) -> Result<RatingSummary, DbError> {
    let summary = sqlx::query_as::<_, RatingSummary>(
        "SELECT COUNT(*) AS review_count, ROUND(AVG(rating), 2) AS average_rating \
         FROM product_reviews \
         WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(summary)
}
