//! Great-circle distance on a spherical Earth.

use crate::math::degrees_to_radians;
use crate::Place;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two latitude/longitude pairs in degrees.
///
/// The inputs are not validated; callers pass coordinates already checked at ingestion.
/// Identical points yield exactly `0.0`.
///
/// # Example
/// ```
/// # use place_daylight::distance::distance_km;
/// let d = distance_km(0.0, 0.0, 0.0, 1.0);
/// assert!((d - 111.19).abs() < 0.5);
/// assert_eq!(distance_km(16.5, 80.6, 16.5, 80.6), 0.0);
/// ```
#[must_use]
#[inline]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let delta_lat = degrees_to_radians(lat2 - lat1);
    let delta_lon = degrees_to_radians(lon2 - lon1);

    let a = (delta_lat / 2.0).sin().powi(2)
        + degrees_to_radians(lat1).cos()
            * degrees_to_radians(lat2).cos()
            * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` past 1 for antipodal points.
    let a = a.min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance in kilometers between two catalog places.
#[must_use]
pub fn distance_between(from: &Place, to: &Place) -> f64 {
    distance_km(from.lat(), from.lon(), to.lat(), to.lon())
}
