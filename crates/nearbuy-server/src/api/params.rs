//! Validation for the location and paging query parameters shared by the
//! search and nearby endpoints.

use nearbuy_core::{Coordinate, DEFAULT_MAX_DISTANCE_KM, DEFAULT_PAGE, DEFAULT_PER_PAGE};
use serde::Deserialize;

use super::ApiError;

pub(super) const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub(super) struct LocationParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A validated search origin and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Origin {
    pub point: Coordinate,
    pub radius_km: f64,
}

impl LocationParams {
    /// Returns `None` when neither coordinate was given.
    pub(super) fn origin(&self, request_id: &str) -> Result<Option<Origin>, ApiError> {
        let point = match (self.lat, self.lng) {
            (None, None) => return Ok(None),
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng),
            _ => {
                return Err(ApiError::new(
                    request_id,
                    "validation_error",
                    "lat and lng must be supplied together",
                ))
            }
        };

        if !point.is_valid() {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                "lat must be within [-90, 90] and lng within [-180, 180]",
            ));
        }

        let radius_km = self.radius.unwrap_or(DEFAULT_MAX_DISTANCE_KM);
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                "radius must be a non-negative number of kilometres",
            ));
        }

        Ok(Some(Origin { point, radius_km }))
    }
}

impl PageParams {
    /// Returns `(page, per_page)` with defaults applied.
    pub(super) fn resolve(&self, request_id: &str) -> Result<(i64, i64), ApiError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);

        if page < 1 {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                "page must be at least 1",
            ));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                format!("per_page must be between 1 and {MAX_PER_PAGE}"),
            ));
        }

        Ok((page, per_page))
    }
}
