//! Product catalog reads: search, product detail, availability, categories.
//!
//! Search and availability rows come from the product → category →
//! shop_products → shops → shop_addresses join and only include stock > 0.

use chrono::{DateTime, Utc};
use nearbuy_core::{BoundingBox, Coordinate, Located};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// One (product, shop) pair returned by product search.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSearchRow {
    pub product_id: i64,
    pub product_name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub stock: i32,
    pub shop_id: i64,
    pub shop_name: String,
    pub city: Option<String>,
    pub area: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Located for ProductSearchRow {
    fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }
}

/// Input filters for product search.
///
/// Text filters are case-insensitive substring matches. Blank strings are
/// treated as absent. `within` limits rows to a coordinate box and drops rows
/// without coordinates.
#[derive(Debug, Clone, Default)]
pub struct ProductSearchFilters<'a> {
    pub query: Option<&'a str>,
    pub city: Option<&'a str>,
    pub category: Option<&'a str>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub within: Option<BoundingBox>,
}

/// A product with its category name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub product_name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub category_id: i64,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// A shop currently stocking a given product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductAvailabilityRow {
    pub shop_id: i64,
    pub shop_name: String,
    pub shop_image: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub city: Option<String>,
    pub area: Option<String>,
    pub landmark: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Located for ProductAvailabilityRow {
    fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub category_name: String,
    pub category_description: Option<String>,
}

/// Build an `ILIKE` substring pattern, escaping the wildcard characters.
pub(crate) fn contains_pattern(raw: Option<&str>) -> Option<String> {
    let trimmed = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let mut pattern = String::with_capacity(trimmed.len() + 2);
    pattern.push('%');
    for c in trimmed.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

/// Search in-stock products across shops.
///
/// Results are ordered by `product_name ASC, price ASC, shop_id ASC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_products(
    pool: &PgPool,
    filters: ProductSearchFilters<'_>,
) -> Result<Vec<ProductSearchRow>, DbError> {
    let within = filters.within;
    let rows = sqlx::query_as::<_, ProductSearchRow>(
        "SELECT \
             p.id AS product_id, p.product_name, p.brand, p.description, p.color, \
             pc.category_name AS category, \
             sp.price, sp.stock, \
             s.id AS shop_id, s.shop_name, \
             sa.city, sa.area, \
             sa.latitude::float8 AS latitude, \
             sa.longitude::float8 AS longitude \
         FROM products p \
         JOIN product_categories pc ON pc.id = p.category_id \
         JOIN shop_products sp ON sp.product_id = p.id \
         JOIN shops s ON s.id = sp.shop_id \
         JOIN shop_addresses sa ON sa.shop_id = s.id \
         WHERE sp.stock > 0 \
           AND ($1::TEXT IS NULL OR p.product_name ILIKE $1) \
           AND ($2::TEXT IS NULL OR sa.city ILIKE $2) \
           AND ($3::TEXT IS NULL OR pc.category_name ILIKE $3) \
           AND ($4::NUMERIC IS NULL OR sp.price >= $4) \
           AND ($5::NUMERIC IS NULL OR sp.price <= $5) \
           AND ($6::FLOAT8 IS NULL OR sa.latitude::float8 BETWEEN $6 AND $7) \
           AND ($8::FLOAT8 IS NULL OR sa.longitude::float8 BETWEEN $8 AND $9) \
         ORDER BY p.product_name ASC, sp.price ASC, s.id ASC",
    )
    .bind(contains_pattern(filters.query))
    .bind(contains_pattern(filters.city))
    .bind(contains_pattern(filters.category))
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(within.map(|b| b.min_lat))
    .bind(within.map(|b| b.max_lat))
    .bind(within.map(|b| b.min_lon))
    .bind(within.map(|b| b.max_lon))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a product by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, product_id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT p.id, p.product_name, p.brand, p.description, p.color, \
                p.category_id, pc.category_name AS category, p.created_at \
         FROM products p \
         JOIN product_categories pc ON pc.id = p.category_id \
         WHERE p.id = $1",
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists every shop with the product in stock, cheapest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_availability(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<ProductAvailabilityRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductAvailabilityRow>(
        "SELECT \
             s.id AS shop_id, s.shop_name, s.shop_image, \
             sp.price, sp.stock, \
             sa.city, sa.area, sa.landmark, \
             sa.latitude::float8 AS latitude, \
             sa.longitude::float8 AS longitude \
         FROM shop_products sp \
         JOIN shops s ON s.id = sp.shop_id \
         JOIN shop_addresses sa ON sa.shop_id = s.id \
         WHERE sp.product_id = $1 AND sp.stock > 0 \
         ORDER BY sp.price ASC, s.id ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns image URLs for a product in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_images(pool: &PgPool, product_id: i64) -> Result<Vec<String>, DbError> {
    let urls = sqlx::query_scalar::<_, String>(
        "SELECT image_url FROM product_images WHERE product_id = $1 ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(urls)
}

/// Returns all categories ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, category_name, category_description \
         FROM product_categories \
         ORDER BY category_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
