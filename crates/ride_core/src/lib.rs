//! Geo core for the ride-sharing app: great-circle distance, curved map
//! routes, proximity matching of ride candidates, offer/request compatibility
//! scoring and location tracking state.
//!
//! The math ([`geo::distance_km`], [`route::build_curved_route`],
//! [`proximity::match_by_proximity`]) is pure and total. Validation lives at
//! the checked entry points ([`geo::Coordinate::try_new`],
//! [`proximity::ProximityMatcher::try_match`], [`config::RideGeoConfig::validate`]).

pub mod config;
pub mod error;
pub mod geo;
pub mod matching;
pub mod proximity;
pub mod route;
pub mod routing;
pub mod tracking;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;

pub use error::{Error, Result};
pub use geo::{distance_km, Coordinate};
pub use proximity::{match_by_proximity, Candidate, CandidateWithDistance, Located};
pub use route::{build_curved_route, RoutePolyline};
