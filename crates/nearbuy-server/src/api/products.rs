use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use nearbuy_core::{
    filter_and_rank, paginate, round_distance, BoundingBox, Coordinate, Located, Page,
};
use nearbuy_db::{ProductAvailabilityRow, ProductSearchFilters, ProductSearchRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::{AuthUser, MaybeAuthUser, RequestId};

use super::params::{LocationParams, PageParams};
use super::users::current_user;
use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Default, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductSearchItem {
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
    /// Present only when the search had an origin.
    pub distance_km: Option<f64>,
}

impl ProductSearchItem {
    fn from_row(row: ProductSearchRow, distance_km: Option<f64>) -> Self {
        Self {
            product_id: row.product_id,
            product_name: row.product_name,
            brand: row.brand,
            description: row.description,
            color: row.color,
            category: row.category,
            price: row.price,
            stock: row.stock,
            shop_id: row.shop_id,
            shop_name: row.shop_name,
            city: row.city,
            area: row.area,
            latitude: row.latitude,
            longitude: row.longitude,
            distance_km,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    pub id: i64,
    pub product_name: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub category: String,
    pub images: Vec<String>,
    pub rating: RatingItem,
    pub availability: Vec<AvailabilityItem>,
    pub reviews: Vec<ReviewItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct RatingItem {
    pub average: Option<Decimal>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct AvailabilityItem {
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
    pub distance_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReviewItem {
    pub id: i64,
    pub user_name: String,
    pub rating: Decimal,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
}

/// Rank availability rows by distance from `origin`.
///
/// Unlike search there is no radius here: every stocking shop is listed and
/// shops without coordinates sort last.
fn sort_availability(
    rows: Vec<ProductAvailabilityRow>,
    origin: Option<Coordinate>,
) -> Vec<AvailabilityItem> {
    let mut items: Vec<AvailabilityItem> = rows
        .into_iter()
        .map(|row| {
            let distance_km = origin
                .zip(row.coordinate())
                .map(|(from, to)| round_distance(from.distance_to(&to)));
            AvailabilityItem {
                shop_id: row.shop_id,
                shop_name: row.shop_name,
                shop_image: row.shop_image,
                price: row.price,
                stock: row.stock,
                city: row.city,
                area: row.area,
                landmark: row.landmark,
                latitude: row.latitude,
                longitude: row.longitude,
                distance_km,
            }
        })
        .collect();

    if origin.is_some() {
        items.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
    items
}

pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<MaybeAuthUser>,
    Query(search): Query<SearchQuery>,
    Query(location): Query<LocationParams>,
    Query(paging): Query<PageParams>,
) -> Result<Json<ApiResponse<Page<ProductSearchItem>>>, ApiError> {
    let origin = location.origin(&req_id.0)?;
    let (page, per_page) = paging.resolve(&req_id.0)?;

    let filters = ProductSearchFilters {
        query: search.q.as_deref(),
        city: search.city.as_deref(),
        category: search.category.as_deref(),
        min_price: search.min_price,
        max_price: search.max_price,
        within: origin.map(|o| BoundingBox::around(o.point, o.radius_km)),
    };
    let rows = nearbuy_db::search_products(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items: Vec<ProductSearchItem> = match origin {
        Some(origin) => filter_and_rank(rows, origin.point, origin.radius_km)
            .into_iter()
            .map(|ranked| ProductSearchItem::from_row(ranked.record, Some(ranked.distance_km)))
            .collect(),
        None => rows
            .into_iter()
            .map(|row| ProductSearchItem::from_row(row, None))
            .collect(),
    };

    if let (Some(auth), Some(term)) = (caller.0, search.q.as_deref()) {
        record_history(&state, &req_id.0, auth, term).await;
    }

    Ok(Json(ApiResponse::new(
        paginate(items, page, per_page),
        req_id.0,
    )))
}

/// History is best-effort: failures are logged and never fail the search.
async fn record_history(
    state: &AppState,
    req_id: &str,
    auth: AuthUser,
    term: &str,
) {
    let Ok(user) = current_user(state, req_id, auth).await else {
        return;
    };
    if let Err(e) = nearbuy_db::record_search(&state.pool, user.id, term).await {
        tracing::warn!(error = %e, "failed to record search history");
    }
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
    Query(location): Query<LocationParams>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let origin = location.origin(&req_id.0)?.map(|o| o.point);
    let db_err = |e: nearbuy_db::DbError| map_db_error(req_id.0.clone(), &e);

    let product = nearbuy_db::get_product(&state.pool, product_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "product not found"))?;

    let availability = nearbuy_db::list_product_availability(&state.pool, product_id)
        .await
        .map_err(db_err)?;
    if availability.is_empty() {
        return Err(ApiError::new(
            req_id.0.clone(),
            "not_found",
            "product is not in stock at any shop",
        ));
    }

    let images = nearbuy_db::list_product_images(&state.pool, product_id)
        .await
        .map_err(db_err)?;
    let reviews = nearbuy_db::list_product_reviews(&state.pool, product_id)
        .await
        .map_err(db_err)?;
    let summary = nearbuy_db::get_rating_summary(&state.pool, product_id)
        .await
        .map_err(db_err)?;

    let data = ProductDetail {
        id: product.id,
        product_name: product.product_name,
        brand: product.brand,
        description: product.description,
        color: product.color,
        category: product.category,
        images,
        rating: RatingItem {
            average: summary.average_rating,
            count: summary.review_count,
        },
        availability: sort_availability(availability, origin),
        reviews: reviews
            .into_iter()
            .map(|r| ReviewItem {
                id: r.id,
                user_name: r.user_name,
                rating: r.rating,
                review_text: r.review_text,
                created_at: r.created_at,
            })
            .collect(),
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
