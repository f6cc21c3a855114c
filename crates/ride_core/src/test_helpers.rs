//! Test helpers: well-known coordinates and candidate builders shared across
//! unit tests, integration tests and benchmarks.

use crate::geo::{Coordinate, EARTH_RADIUS_KM};
use crate::proximity::Candidate;

/// MG Road, Bangalore. Default origin in tests.
pub const MG_ROAD: Coordinate = Coordinate::new(12.9716, 77.5946);

/// Koramangala, Bangalore (~5 km from MG Road).
pub const KORAMANGALA: Coordinate = Coordinate::new(12.9352, 77.6245);

/// Whitefield, Bangalore (~17 km from MG Road).
pub const WHITEFIELD: Coordinate = Coordinate::new(12.9698, 77.7499);

/// Mumbai (>800 km from MG Road).
pub const MUMBAI: Coordinate = Coordinate::new(18.9432, 72.8236);

/// Kilometres spanned by one degree of latitude on the haversine sphere.
pub const KM_PER_DEGREE_LATITUDE: f64 = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;

/// A coordinate `km` kilometres due north of `origin` (same longitude).
///
/// Distances along a meridian are exact up to floating point, which makes
/// this the easiest way to place a candidate at a chosen distance.
pub fn north_of(origin: Coordinate, km: f64) -> Coordinate {
    Coordinate::new(origin.latitude + km / KM_PER_DEGREE_LATITUDE, origin.longitude)
}

/// A candidate `km` kilometres due north of `origin`.
pub fn candidate_north_of(id: &str, origin: Coordinate, km: f64) -> Candidate {
    Candidate::new(id, north_of(origin, km))
}

/// The three-city scenario: Whitefield, Koramangala and Mumbai, in that order.
pub fn bangalore_scenario() -> Vec<Candidate> {
    vec![
        Candidate::new("A", WHITEFIELD).with_field("name", "Whitefield pickup"),
        Candidate::new("B", KORAMANGALA).with_field("name", "Koramangala pickup"),
        Candidate::new("C", MUMBAI).with_field("name", "Mumbai pickup"),
    ]
}
