use nearbuy_core::{filter_and_rank, paginate, BoundingBox, Coordinate, Page, Ranked};
use nearbuy_db::ShopLocationRow;

/// Validated arguments for the `nearby` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NearbyQuery {
    pub origin: Coordinate,
    pub radius_km: f64,
    pub page: i64,
    pub per_page: i64,
}

impl NearbyQuery {
    /// # Errors
    ///
    /// Returns an error for out-of-range coordinates, a negative radius, or
    /// non-positive paging values.
    pub(crate) fn new(
        lat: f64,
        lng: f64,
        radius_km: f64,
        page: i64,
        per_page: i64,
    ) -> anyhow::Result<Self> {
        let origin = Coordinate::new(lat, lng);
        if !origin.is_valid() {
            anyhow::bail!("--lat must be within [-90, 90] and --lng within [-180, 180]");
        }
        if !radius_km.is_finite() || radius_km < 0.0 {
            anyhow::bail!("--radius must be a non-negative number of kilometres");
        }
        if page < 1 || per_page < 1 {
            anyhow::bail!("--page and --per-page must be at least 1");
        }

        Ok(Self {
            origin,
            radius_km,
            page,
            per_page,
        })
    }
}

/// Print ranked shops around the query origin.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_nearby(pool: &sqlx::PgPool, query: &NearbyQuery) -> anyhow::Result<()> {
    let within = BoundingBox::around(query.origin, query.radius_km);
    let rows = nearbuy_db::list_shop_locations(pool, Some(within)).await?;
    let ranked = filter_and_rank(rows, query.origin, query.radius_km);
    let page = paginate(ranked, query.page, query.per_page);

    if page.total == 0 {
        println!(
            "no shops within {} km of ({}, {})",
            query.radius_km, query.origin.latitude, query.origin.longitude
        );
        return Ok(());
    }

    print!("{}", render_table(&page));
    Ok(())
}

fn render_table(page: &Page<Ranked<ShopLocationRow>>) -> String {
    let mut out = format!(
        "{:<8}{:>10}  {:<32}{:<20}{:>8}\n",
        "ID", "KM", "SHOP", "CITY", "ITEMS"
    );
    for ranked in &page.items {
        let shop = &ranked.record;
        let name = if shop.shop_name.chars().count() > 30 {
            format!("{}...", shop.shop_name.chars().take(27).collect::<String>())
        } else {
            shop.shop_name.clone()
        };
        out.push_str(&format!(
            "{:<8}{:>10.2}  {:<32}{:<20}{:>8}\n",
            shop.id,
            ranked.distance_km,
            name,
            shop.city.as_deref().unwrap_or("-"),
            shop.products_in_stock
        ));
    }
    out.push_str(&format!(
        "page {} of {} ({} shops)\n",
        page.page, page.pages, page.total
    ));
    out
}
