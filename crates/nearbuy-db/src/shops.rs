use chrono::{DateTime, NaiveTime, Utc};
use nearbuy_core::{BoundingBox, Coordinate, Located, Timing};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Shop header row with owner and address flattened in.
///
/// Owner and address columns are nullable because both joins are `LEFT JOIN`s.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopDetailRow {
    pub id: i64,
    pub shop_name: String,
    pub shop_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub owner_email: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub landmark: Option<String>,
    pub area: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopTimingRow {
    pub day: String,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
}

impl ShopTimingRow {
    #[must_use]
    pub fn as_timing(&self) -> Timing<'_> {
        Timing {
            day: &self.day,
            open_time: self.open_time,
            close_time: self.close_time,
        }
    }
}

/// A product line in a shop's inventory.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopProductRow {
    pub product_id: i64,
    pub product_name: String,
    pub brand: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub stock: i32,
}

/// Minimal shop row used for nearby-shop ranking.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopLocationRow {
    pub id: i64,
    pub shop_name: String,
    pub shop_image: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub landmark: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Number of distinct products currently in stock.
    pub products_in_stock: i64,
}

impl Located for ShopLocationRow {
    fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }
}

/// Returns a shop with owner and address, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_shop_detail(pool: &PgPool, shop_id: i64) -> Result<Option<ShopDetailRow>, DbError> {
    let row = sqlx::query_as::<_, ShopDetailRow>(
        "SELECT \
             s.id, s.shop_name, s.shop_image, s.created_at, \
             o.owner_name, o.phone AS owner_phone, o.email AS owner_email, \
             sa.city, sa.country, sa.pincode, sa.landmark, sa.area, \
             sa.latitude::float8 AS latitude, \
             sa.longitude::float8 AS longitude \
         FROM shops s \
         LEFT JOIN shop_owners o ON o.id = s.owner_id \
         LEFT JOIN shop_addresses sa ON sa.shop_id = s.id \
         WHERE s.id = $1",
    )
    .bind(shop_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the stored timing rows for a shop in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_shop_timings(pool: &PgPool, shop_id: i64) -> Result<Vec<ShopTimingRow>, DbError> {
    let rows = sqlx::query_as::<_, ShopTimingRow>(
        "SELECT day, open_time, close_time \
         FROM shop_timings \
         WHERE shop_id = $1 \
         ORDER BY id",
    )
    .bind(shop_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the in-stock inventory for a shop, ordered by product name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_shop_products(pool: &PgPool, shop_id: i64) -> Result<Vec<ShopProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ShopProductRow>(
        "SELECT \
             p.id AS product_id, p.product_name, p.brand, \
             pc.category_name AS category, \
             sp.price, sp.stock \
         FROM shop_products sp \
         JOIN products p ON p.id = sp.product_id \
         JOIN product_categories pc ON pc.id = p.category_id \
         WHERE sp.shop_id = $1 AND sp.stock > 0 \
         ORDER BY p.product_name ASC",
    )
    .bind(shop_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns every shop with an address row, ordered by id.
///
/// With `within`, only shops whose coordinates fall inside the box are kept,
/// which drops unmapped shops. Without it, unmapped shops are included with
/// `None` coordinates.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_shop_locations(
    pool: &PgPool,
    within: Option<BoundingBox>,
) -> Result<Vec<ShopLocationRow>, DbError> {
    let rows = sqlx::query_as::<_, ShopLocationRow>(
        "SELECT \
             s.id, s.shop_name, s.shop_image, \
             sa.city, sa.area, sa.landmark, \
             sa.latitude::float8 AS latitude, \
             sa.longitude::float8 AS longitude, \
             COALESCE(( \
                 SELECT COUNT(*) FROM shop_products sp \
                 WHERE sp.shop_id = s.id AND sp.stock > 0 \
             ), 0) AS products_in_stock \
         FROM shops s \
         JOIN shop_addresses sa ON sa.shop_id = s.id \
         WHERE ($1::FLOAT8 IS NULL OR sa.latitude::float8 BETWEEN $1 AND $2) \
           AND ($3::FLOAT8 IS NULL OR sa.longitude::float8 BETWEEN $3 AND $4) \
         ORDER BY s.id",
    )
    .bind(within.map(|b| b.min_lat))
    .bind(within.map(|b| b.max_lat))
    .bind(within.map(|b| b.min_lon))
    .bind(within.map(|b| b.max_lon))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
