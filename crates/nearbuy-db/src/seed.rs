use std::collections::HashMap;

use nearbuy_core::catalog::{OwnerConfig, ShopConfig};
use nearbuy_core::CatalogFile;
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

/// Counts of catalog entries written by [`seed_catalog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub images: usize,
    pub shops: usize,
    pub stock_lines: usize,
}

/// Upsert a validated catalog into the database.
///
/// Categories, products, and shops are keyed by name, so re-running the seed
/// updates rows in place. All upserts run inside a single transaction; if any
/// operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if a product references a category (or a
/// shop stocks a product) absent from the catalog, or [`DbError::Sqlx`] if
/// any database operation fails.
pub async fn seed_catalog(pool: &PgPool, catalog: &CatalogFile) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    let mut category_ids: HashMap<String, i64> = HashMap::new();
    for category in &catalog.categories {
        let name = category.name.trim();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO product_categories (category_name, category_description) \
             VALUES ($1, $2) \
             ON CONFLICT (category_name) DO UPDATE SET \
                 category_description = EXCLUDED.category_description \
             RETURNING id",
        )
        .bind(name)
        .bind(&category.description)
        .fetch_one(&mut *tx)
        .await?;

        category_ids.insert(name.to_lowercase(), id);
        summary.categories += 1;
    }

    let mut product_ids: HashMap<String, i64> = HashMap::new();
    for product in &catalog.products {
        let name = product.name.trim();
        let category_id = *category_ids
            .get(&product.category.trim().to_lowercase())
            .ok_or(DbError::NotFound)?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO products (product_name, category_id, brand, description, color) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (product_name) DO UPDATE SET \
                 category_id = EXCLUDED.category_id, \
                 brand = EXCLUDED.brand, \
                 description = EXCLUDED.description, \
                 color = EXCLUDED.color, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(name)
        .bind(category_id)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(&product.color)
        .fetch_one(&mut *tx)
        .await?;

        for url in &product.images {
            sqlx::query(
                "INSERT INTO product_images (product_id, image_url) \
                 VALUES ($1, $2) \
                 ON CONFLICT (product_id, image_url) DO NOTHING",
            )
            .bind(id)
            .bind(url)
            .execute(&mut *tx)
            .await?;
            summary.images += 1;
        }

        product_ids.insert(name.to_lowercase(), id);
        summary.products += 1;
    }

    for shop in &catalog.shops {
        summary.stock_lines += seed_shop(&mut tx, shop, &product_ids).await?;
        summary.shops += 1;
    }

    tx.commit().await?;
    Ok(summary)
}

/// Upsert one shop with its owner, address, timings, and stock.
///
/// Returns the number of stock lines written.
async fn seed_shop(
    tx: &mut Transaction<'_, Postgres>,
    shop: &ShopConfig,
    product_ids: &HashMap<String, i64>,
) -> Result<usize, DbError> {
    let owner_id = upsert_owner(tx, shop.name.trim(), &shop.owner).await?;

    let shop_id: i64 = sqlx::query_scalar(
        "INSERT INTO shops (shop_name, owner_id, shop_image) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (shop_name) DO UPDATE SET \
             owner_id = EXCLUDED.owner_id, \
             shop_image = EXCLUDED.shop_image, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(shop.name.trim())
    .bind(owner_id)
    .bind(&shop.image)
    .fetch_one(&mut **tx)
    .await?;

    let address = &shop.address;
    sqlx::query(
        "INSERT INTO shop_addresses \
             (shop_id, city, country, pincode, landmark, area, latitude, longitude) \
         VALUES ($1, $2, $3, $4, $5, $6, $7::FLOAT8, $8::FLOAT8) \
         ON CONFLICT (shop_id) DO UPDATE SET \
             city = EXCLUDED.city, \
             country = EXCLUDED.country, \
             pincode = EXCLUDED.pincode, \
             landmark = EXCLUDED.landmark, \
             area = EXCLUDED.area, \
             latitude = EXCLUDED.latitude, \
             longitude = EXCLUDED.longitude",
    )
    .bind(shop_id)
    .bind(&address.city)
    .bind(&address.country)
    .bind(&address.pincode)
    .bind(&address.landmark)
    .bind(&address.area)
    .bind(address.latitude)
    .bind(address.longitude)
    .execute(&mut **tx)
    .await?;

    for timing in &shop.timings {
        sqlx::query(
            "INSERT INTO shop_timings (shop_id, day, open_time, close_time) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (shop_id, day) DO UPDATE SET \
                 open_time = EXCLUDED.open_time, \
                 close_time = EXCLUDED.close_time",
        )
        .bind(shop_id)
        .bind(timing.day.trim())
        .bind(timing.open_time())
        .bind(timing.close_time())
        .execute(&mut **tx)
        .await?;
    }

    let mut lines = 0usize;
    for item in &shop.stock {
        let product_id = *product_ids
            .get(&item.product.trim().to_lowercase())
            .ok_or(DbError::NotFound)?;

        sqlx::query(
            "INSERT INTO shop_products (shop_id, product_id, price, stock) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (shop_id, product_id) DO UPDATE SET \
                 price = EXCLUDED.price, \
                 stock = EXCLUDED.stock, \
                 updated_at = NOW()",
        )
        .bind(shop_id)
        .bind(product_id)
        .bind(item.price)
        .bind(item.stock)
        .execute(&mut **tx)
        .await?;
        lines += 1;
    }

    Ok(lines)
}

/// Owners are matched by email, then phone. An owner with neither keeps the
/// row already linked to the shop. Otherwise a new row is added.
async fn upsert_owner(
    tx: &mut Transaction<'_, Postgres>,
    shop_name: &str,
    owner: &OwnerConfig,
) -> Result<i64, DbError> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM shop_owners \
         WHERE ($1::TEXT IS NOT NULL AND email = $1) \
            OR ($2::TEXT IS NOT NULL AND phone = $2) \
            OR ($1::TEXT IS NULL AND $2::TEXT IS NULL \
                AND id = (SELECT owner_id FROM shops WHERE shop_name = $3)) \
         ORDER BY (email = $1) DESC NULLS LAST, id \
         LIMIT 1",
    )
    .bind(&owner.email)
    .bind(&owner.phone)
    .bind(shop_name)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(id) = existing {
        sqlx::query(
            "UPDATE shop_owners SET \
                 owner_name = $2, \
                 phone = COALESCE($3, phone), \
                 email = COALESCE($4, email) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(owner.name.trim())
        .bind(&owner.phone)
        .bind(&owner.email)
        .execute(&mut **tx)
        .await?;
        return Ok(id);
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO shop_owners (owner_name, phone, email) \
         VALUES ($1, $2, $3) \
         RETURNING id",
    )
    .bind(owner.name.trim())
    .bind(&owner.phone)
    .bind(&owner.email)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}
