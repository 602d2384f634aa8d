use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use nearbuy_core::{filter_and_rank, paginate, weekly_hours, BoundingBox, DayHours, Page};
use nearbuy_db::{ShopDetailRow, ShopLocationRow, ShopTimingRow};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::middleware::RequestId;

use super::params::{LocationParams, PageParams};
use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct NearbyShopItem {
    pub id: i64,
    pub shop_name: String,
    pub shop_image: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
    pub landmark: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub products_in_stock: i64,
    pub distance_km: Option<f64>,
}

impl NearbyShopItem {
    fn from_row(row: ShopLocationRow, distance_km: Option<f64>) -> Self {
        Self {
            id: row.id,
            shop_name: row.shop_name,
            shop_image: row.shop_image,
            city: row.city,
            area: row.area,
            landmark: row.landmark,
            latitude: row.latitude,
            longitude: row.longitude,
            products_in_stock: row.products_in_stock,
            distance_km,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OwnerItem {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AddressItem {
    pub city: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub landmark: Option<String>,
    pub area: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct TimingItem {
    pub day: String,
    /// `HH:MM`, 24-hour clock.
    pub open_time: Option<String>,
    pub close_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ShopProductItem {
    pub product_id: i64,
    pub product_name: String,
    pub brand: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct ShopDetail {
    pub id: i64,
    pub shop_name: String,
    pub shop_image: Option<String>,
    pub owner: Option<OwnerItem>,
    pub address: AddressItem,
    pub timings: Vec<TimingItem>,
    pub weekly_hours: Vec<DayHours>,
    pub products: Vec<ShopProductItem>,
}

fn timing_item(row: &ShopTimingRow) -> TimingItem {
    TimingItem {
        day: row.day.clone(),
        open_time: row.open_time.map(|t| t.format("%H:%M").to_string()),
        close_time: row.close_time.map(|t| t.format("%H:%M").to_string()),
    }
}

fn split_detail(row: ShopDetailRow) -> (Option<OwnerItem>, AddressItem) {
    let owner = row.owner_name.map(|name| OwnerItem {
        name,
        phone: row.owner_phone,
        email: row.owner_email,
    });
    let address = AddressItem {
        city: row.city,
        country: row.country,
        pincode: row.pincode,
        landmark: row.landmark,
        area: row.area,
        latitude: row.latitude,
        longitude: row.longitude,
    };
    (owner, address)
}

pub(super) async fn list_nearby_shops(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(location): Query<LocationParams>,
    Query(paging): Query<PageParams>,
) -> Result<Json<ApiResponse<Page<NearbyShopItem>>>, ApiError> {
    let origin = location.origin(&req_id.0)?;
    let (page, per_page) = paging.resolve(&req_id.0)?;

    let within = origin.map(|o| BoundingBox::around(o.point, o.radius_km));
    let rows = nearbuy_db::list_shop_locations(&state.pool, within)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items: Vec<NearbyShopItem> = match origin {
        Some(origin) => {
            let ranked = filter_and_rank(rows, origin.point, origin.radius_km);
            tracing::debug!(
                count = ranked.len(),
                radius_km = origin.radius_km,
                "ranked nearby shops"
            );
            ranked
                .into_iter()
                .map(|r| NearbyShopItem::from_row(r.record, Some(r.distance_km)))
                .collect()
        }
        None => rows
            .into_iter()
            .map(|row| NearbyShopItem::from_row(row, None))
            .collect(),
    };

    Ok(Json(ApiResponse::new(
        paginate(items, page, per_page),
        req_id.0,
    )))
}

pub(super) async fn get_shop(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(shop_id): Path<i64>,
) -> Result<Json<ApiResponse<ShopDetail>>, ApiError> {
    let db_err = |e: nearbuy_db::DbError| map_db_error(req_id.0.clone(), &e);

    let shop = nearbuy_db::get_shop_detail(&state.pool, shop_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "shop not found"))?;
    let timings = nearbuy_db::list_shop_timings(&state.pool, shop_id)
        .await
        .map_err(db_err)?;
    let products = nearbuy_db::list_shop_products(&state.pool, shop_id)
        .await
        .map_err(db_err)?;

    let id = shop.id;
    let shop_name = shop.shop_name.clone();
    let shop_image = shop.shop_image.clone();
    let (owner, address) = split_detail(shop);

    let data = ShopDetail {
        id,
        shop_name,
        shop_image,
        owner,
        address,
        weekly_hours: weekly_hours(timings.iter().map(ShopTimingRow::as_timing)),
        timings: timings.iter().map(timing_item).collect(),
        products: products
            .into_iter()
            .map(|p| ShopProductItem {
                product_id: p.product_id,
                product_name: p.product_name,
                brand: p.brand,
                category: p.category,
                price: p.price,
                stock: p.stock,
            })
            .collect(),
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
