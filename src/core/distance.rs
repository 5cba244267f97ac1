use crate::models::{Coordinates, DistanceResult};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Miles per kilometer
const KM_TO_MILES: f64 = 0.621371;

/// Calculate the unrounded Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let delta_lat = lat2 - lat1;
    let delta_lon = lon2 - lon1;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Near-antipodal points can push `a` a few ulps past 1
    let a = a.min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Round to two decimal places on the exact decimal expansion, ties to even
pub fn round_to_cents(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Great-circle distance in kilometers and miles, both rounded to cents
///
/// Miles are derived from the already-rounded kilometers, so
/// `miles == round(round(km_raw, 2) * 0.621371, 2)`.
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> DistanceResult {
    let kilometers = round_to_cents(haversine_distance(lat1, lon1, lat2, lon2));
    let miles = round_to_cents(kilometers * KM_TO_MILES);

    DistanceResult { kilometers, miles }
}

/// [`calculate_distance`] over two resolved points
#[inline]
pub fn distance_between(from: Coordinates, to: Coordinates) -> DistanceResult {
    calculate_distance(from.latitude, from.longitude, to.latitude, to.longitude)
}
