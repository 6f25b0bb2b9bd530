//! Geodesic distance and length over WGS84 coordinates.
//!
//! Haversine in `f64`: the pipeline's tolerances go down to centimeters
//! (sub-tolerance endpoint gaps), which f32 cannot resolve at continental
//! longitudes.

use geo::{Coord, LineString};

/// Mean Earth radius, meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude (and of longitude at the equator).
/// Matches the conventional factor used to express metric simplification
/// tolerances in degrees.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Haversine great-circle distance in meters between two (lng, lat) coords.
pub fn haversine_m(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d_lat = (b.y - a.y).to_radians();
    let d_lng = (b.x - a.x).to_radians();

    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Geodesic length of a linestring in meters.
pub fn line_length_m(line: &LineString<f64>) -> f64 {
    line.0.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}

/// Geodesic length of a linestring in kilometers.
pub fn line_length_km(line: &LineString<f64>) -> f64 {
    line_length_m(line) / 1000.0
}

/// Convert a metric tolerance to the equivalent degrees at the equator.
/// Conservative at higher latitudes (the degree radius shrinks with
/// cos(lat), so envelopes expanded by this value only grow).
#[inline]
pub fn meters_to_degrees(m: f64) -> f64 {
    m / METERS_PER_DEGREE
}

/// Rough inverse of [`meters_to_degrees`] for reporting.
#[inline]
pub fn degrees_to_meters(deg: f64) -> f64 {
    deg * METERS_PER_DEGREE
}
