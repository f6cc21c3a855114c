//! Offer/request compatibility scoring.
//!
//! A ride offer and a ride request are compatible when their pickups and
//! drops are close, their departure times are near each other and both users
//! are well rated. [`CompatibilityScorer`] turns that into a 0–100 score and
//! ranks the candidate rides for a given ride.

pub mod scoring;
pub mod types;

pub use scoring::{CompatibilityScorer, ScoringConfig};
pub use types::{MatchStatus, Ride, RideKind, RideMatch, RideStatus};
