//! Great-circle distance and danger-zone proximity rules.

use crate::model::DangerZone;

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Proximity alerts fire within 1.5x a zone's stated radius, so victims get
/// warned before they are inside the hazard circle itself.
const PROXIMITY_FACTOR: f64 = 1.5;

/// Haversine distance between two coordinates, in kilometers.
///
/// Total over all finite inputs; out-of-range degrees propagate as NaN
/// rather than erroring, which callers treat as "not nearby".
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// First danger zone whose alert circle covers the given location.
///
/// A zone is "nearby" when the Haversine distance is within 1.5x its radius
/// (converted to km). Returns the first hit in zone insertion order, not
/// the geometrically closest one; victim clients show a single alert and
/// don't need a ranking.
pub fn zone_in_range(lat: f64, lng: f64, zones: &[DangerZone]) -> Option<&DangerZone> {
    zones
        .iter()
        .find(|zone| distance_km(lat, lng, zone.lat, zone.lng) <= (zone.radius / 1000.0) * PROXIMITY_FACTOR)
}
