//! Great-circle distance and proximity ranking.
//!
//! Everything here is pure and allocation-light: callers fetch candidate rows
//! from the database, then hand them to [`filter_and_rank`] to drop anything
//! outside the search radius and order the rest nearest-first.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Search radius applied when the caller does not supply one.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 10.0;

/// Length of one degree of latitude on a sphere of [`EARTH_RADIUS_KM`].
const KM_PER_LAT_DEGREE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// A point on the Earth's surface in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate only when both components are present.
    ///
    /// A row with a latitude but no longitude (or vice versa) cannot be placed
    /// on the map and is treated the same as a row with neither.
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Some(Self::new(latitude?, longitude?))
    }

    /// Returns `true` when both components are finite and inside the valid
    /// latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Haversine distance in kilometres between two points given in degrees.
///
/// No range validation is done. Out-of-range inputs give a defined but
/// meaningless result, and non-finite inputs give a non-finite result.
#[must_use]
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `a` just past 1.0 for antipodal points.
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    c * EARTH_RADIUS_KM
}

/// Round a distance to two decimal places.
///
/// Scales the binary `f64` by 100 and rounds halves away from zero, so a
/// value whose decimal literal ends in 5 only rounds up when its binary form
/// reaches the half. `1.005` is stored just below it and rounds to `1.0`.
#[must_use]
pub fn round_distance(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Anything that may carry a position.
pub trait Located {
    fn coordinate(&self) -> Option<Coordinate>;
}

impl Located for Coordinate {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(*self)
    }
}

impl<T: Located + ?Sized> Located for &T {
    fn coordinate(&self) -> Option<Coordinate> {
        (**self).coordinate()
    }
}

/// A record that passed the radius filter, annotated with its distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    #[serde(flatten)]
    pub record: T,
    /// Distance from the search origin, rounded to two decimals.
    pub distance_km: f64,
}

/// Keep the records within `max_distance_km` of `origin`, nearest first.
///
/// Records without a coordinate are dropped. The radius check uses the exact
/// distance. The attached `distance_km` is rounded with [`round_distance`].
/// Equal distances keep their input order.
pub fn filter_and_rank<T, I>(records: I, origin: Coordinate, max_distance_km: f64) -> Vec<Ranked<T>>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    let mut ranked: Vec<Ranked<T>> = records
        .into_iter()
        .filter_map(|record| {
            let point = record.coordinate()?;
            let km = origin.distance_to(&point);
            // NaN fails this comparison, so non-finite rows never rank.
            (km <= max_distance_km).then(|| Ranked {
                record,
                distance_km: round_distance(km),
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}

/// Latitude-corrected box enclosing every point within a radius of a centre.
///
/// Only useful as a cheap pre-filter: corners of the box lie outside the
/// circle, so results still need [`filter_and_rank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn around(origin: Coordinate, radius_km: f64) -> Self {
        let radius_km = radius_km.max(0.0);
        let lat_delta = radius_km / KM_PER_LAT_DEGREE;
        let min_lat = (origin.latitude - lat_delta).max(-90.0);
        let max_lat = (origin.latitude + lat_delta).min(90.0);

        // Near the poles every meridian is within reach.
        if min_lat <= -90.0 || max_lat >= 90.0 {
            return Self {
                min_lat,
                max_lat,
                min_lon: -180.0,
                max_lon: 180.0,
            };
        }

        // Widest point of the circle is at the latitude furthest from the equator.
        let widest_lat = origin.latitude.abs() + lat_delta;
        let lon_delta = lat_delta / widest_lat.to_radians().cos();
        let min_lon = origin.longitude - lon_delta;
        let max_lon = origin.longitude + lon_delta;

        if lon_delta >= 180.0 || min_lon < -180.0 || max_lon > 180.0 {
            // Crossing the antimeridian: fall back to the full longitude range.
            return Self {
                min_lat,
                max_lat,
                min_lon: -180.0,
                max_lon: 180.0,
            };
        }

        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}
