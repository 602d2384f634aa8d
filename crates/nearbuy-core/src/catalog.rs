//! YAML catalog used to seed categories, products, and shops.

use std::collections::HashSet;
use std::path::Path;

use chrono::{NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::validation::{is_valid_email, is_valid_phone};
use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub name: String,
    /// Must match a `categories[].name` entry.
    pub category: String,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerConfig {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressConfig {
    pub city: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub landmark: Option<String>,
    pub area: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl AddressConfig {
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub day: String,
    /// `HH:MM`, 24-hour clock.
    pub open: Option<String>,
    pub close: Option<String>,
}

impl TimingConfig {
    #[must_use]
    pub fn open_time(&self) -> Option<NaiveTime> {
        self.open.as_deref().and_then(parse_clock)
    }

    #[must_use]
    pub fn close_time(&self) -> Option<NaiveTime> {
        self.close.as_deref().and_then(parse_clock)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// Must match a `products[].name` entry.
    pub product: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    pub name: String,
    pub image: Option<String>,
    pub owner: OwnerConfig,
    pub address: AddressConfig,
    #[serde(default)]
    pub timings: Vec<TimingConfig>,
    #[serde(default)]
    pub stock: Vec<StockConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
    #[serde(default)]
    pub shops: Vec<ShopConfig>,
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Load and validate a catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<CatalogFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_catalog(&content)
}

/// Parse and validate catalog YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_catalog(content: &str) -> Result<CatalogFile, ConfigError> {
    let catalog: CatalogFile =
        serde_yaml::from_str(content).map_err(ConfigError::CatalogFileParse)?;

    validate_catalog(&catalog)?;

    Ok(catalog)
}

fn validate_catalog(catalog: &CatalogFile) -> Result<(), ConfigError> {
    let mut categories = HashSet::new();
    for category in &catalog.categories {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "category name must be non-empty".to_string(),
            ));
        }
        if !categories.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category: '{name}'"
            )));
        }
    }

    let mut products = HashSet::new();
    for product in &catalog.products {
        let name = product.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "product name must be non-empty".to_string(),
            ));
        }
        if !categories.contains(&product.category.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "product '{name}' references unknown category '{}'",
                product.category
            )));
        }
        if !products.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate product: '{name}'"
            )));
        }
    }

    for shop in &catalog.shops {
        validate_shop(shop, &products)?;
    }

    Ok(())
}

fn validate_shop(shop: &ShopConfig, products: &HashSet<String>) -> Result<(), ConfigError> {
    let name = shop.name.trim();
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "shop name must be non-empty".to_string(),
        ));
    }

    if let Some(email) = &shop.owner.email {
        if !is_valid_email(email) {
            return Err(ConfigError::Validation(format!(
                "shop '{name}' owner has invalid email '{email}'"
            )));
        }
    }
    if let Some(phone) = &shop.owner.phone {
        if !is_valid_phone(phone) {
            return Err(ConfigError::Validation(format!(
                "shop '{name}' owner has invalid phone '{phone}'"
            )));
        }
    }

    let address = &shop.address;
    if address.latitude.is_some() != address.longitude.is_some() {
        return Err(ConfigError::Validation(format!(
            "shop '{name}' must set both latitude and longitude, or neither"
        )));
    }
    if let Some(point) = address.coordinate() {
        if !point.is_valid() {
            return Err(ConfigError::Validation(format!(
                "shop '{name}' has out-of-range coordinates ({}, {})",
                point.latitude, point.longitude
            )));
        }
    }

    for timing in &shop.timings {
        if timing.day.trim().parse::<Weekday>().is_err() {
            return Err(ConfigError::Validation(format!(
                "shop '{name}' has unknown day '{}'",
                timing.day
            )));
        }
        for raw in [&timing.open, &timing.close].into_iter().flatten() {
            if parse_clock(raw).is_none() {
                return Err(ConfigError::Validation(format!(
                    "shop '{name}' has invalid time '{raw}' on {}; expected HH:MM",
                    timing.day
                )));
            }
        }
    }

    for item in &shop.stock {
        if !products.contains(&item.product.trim().to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "shop '{name}' stocks unknown product '{}'",
                item.product
            )));
        }
        if item.price.is_sign_negative() {
            return Err(ConfigError::Validation(format!(
                "shop '{name}' has negative price for '{}'",
                item.product
            )));
        }
        if item.stock < 0 {
            return Err(ConfigError::Validation(format!(
                "shop '{name}' has negative stock for '{}'",
                item.product
            )));
        }
    }

    Ok(())
}
