use serde::{Deserialize, Serialize};

use super::types::{MatchStatus, Ride, RideKind, RideMatch};
use crate::error::{Error, Result};

/// Weights and thresholds for [`CompatibilityScorer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub route_overlap_weight: f64,
    pub time_match_weight: f64,
    pub rating_bonus_weight: f64,
    /// Matches scoring below this are dropped.
    pub min_match_score: f64,
    pub max_pickup_distance_km: f64,
    pub max_drop_distance_km: f64,
    /// Share of the route score given to the pickup; the drop gets the rest.
    pub pickup_share: f64,
    /// Departures this close (minutes) score a perfect time match.
    pub perfect_time_window_min: f64,
    /// Departures further apart than this (minutes) score zero.
    pub max_time_difference_min: f64,
    pub max_rating: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            route_overlap_weight: 0.50,
            time_match_weight: 0.25,
            rating_bonus_weight: 0.25,
            min_match_score: 70.0,
            max_pickup_distance_km: 2.0,
            max_drop_distance_km: 3.0,
            pickup_share: 0.6,
            perfect_time_window_min: 15.0,
            max_time_difference_min: 60.0,
            max_rating: 5.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("route_overlap_weight", self.route_overlap_weight),
            ("time_match_weight", self.time_match_weight),
            ("rating_bonus_weight", self.rating_bonus_weight),
            ("min_match_score", self.min_match_score),
            ("perfect_time_window_min", self.perfect_time_window_min),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_config(format!("{name} must be >= 0, got {value}")));
            }
        }
        let positive = [
            ("max_pickup_distance_km", self.max_pickup_distance_km),
            ("max_drop_distance_km", self.max_drop_distance_km),
            ("max_rating", self.max_rating),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::invalid_config(format!("{name} must be > 0, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.pickup_share) {
            return Err(Error::invalid_config(format!(
                "pickup_share must be within [0, 1], got {}",
                self.pickup_share
            )));
        }
        if self.max_time_difference_min.is_nan()
            || self.max_time_difference_min <= self.perfect_time_window_min
        {
            return Err(Error::invalid_config(format!(
                "max_time_difference_min ({}) must exceed perfect_time_window_min ({})",
                self.max_time_difference_min, self.perfect_time_window_min
            )));
        }
        Ok(())
    }
}

/// Weighted compatibility of an offer and a request.
///
/// `score = min(100, 100 * (w_route * route + w_time * time + w_rating * rating))`
/// where each component is in [0, 1].
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityScorer {
    config: ScoringConfig,
}

impl CompatibilityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Overall 0–100 score. Rides by the same user never match.
    pub fn score(&self, offer: &Ride, request: &Ride) -> f64 {
        if offer.user_id == request.user_id {
            return 0.0;
        }
        let c = &self.config;
        let total = self.route_overlap(offer, request) * c.route_overlap_weight * 100.0
            + self.time_match(offer, request) * c.time_match_weight * 100.0
            + self.rating_bonus(offer, request) * c.rating_bonus_weight * 100.0;
        total.min(100.0)
    }

    /// 0–1: how close the pickups and drops are. Zero when either exceeds its
    /// threshold.
    pub fn route_overlap(&self, a: &Ride, b: &Ride) -> f64 {
        let c = &self.config;
        let pickup_km = a.from.distance_km(&b.from);
        let drop_km = a.to.distance_km(&b.to);
        if pickup_km > c.max_pickup_distance_km || drop_km > c.max_drop_distance_km {
            return 0.0;
        }
        let pickup_score = 1.0 - pickup_km / c.max_pickup_distance_km;
        let drop_score = 1.0 - drop_km / c.max_drop_distance_km;
        pickup_score * c.pickup_share + drop_score * (1.0 - c.pickup_share)
    }

    /// 0–1: perfect inside the window, linear fall-off to zero at the maximum.
    pub fn time_match(&self, a: &Ride, b: &Ride) -> f64 {
        let c = &self.config;
        let diff = time_diff_minutes(a, b);
        if diff <= c.perfect_time_window_min {
            1.0
        } else if diff > c.max_time_difference_min {
            0.0
        } else {
            1.0 - (diff - c.perfect_time_window_min)
                / (c.max_time_difference_min - c.perfect_time_window_min)
        }
    }

    /// 0–1: mean rating of both users over the rating scale.
    pub fn rating_bonus(&self, a: &Ride, b: &Ride) -> f64 {
        (a.user_rating + b.user_rating) / 2.0 / self.config.max_rating
    }

    /// Compatible rides for `target`, best score first (ties keep input order).
    ///
    /// Skips the target itself, rides by the same user, rides of the same
    /// kind, rides that are no longer available and, when the target is a
    /// request, offers without a free seat.
    pub fn find_matches_for_ride<'a, I>(&self, target: &Ride, rides: I) -> Vec<RideMatch>
    where
        I: IntoIterator<Item = &'a Ride>,
    {
        let mut matches: Vec<RideMatch> = rides
            .into_iter()
            .filter(|ride| ride.id != target.id && ride.user_id != target.user_id)
            .filter(|ride| ride.kind != target.kind && ride.is_available())
            .filter(|ride| target.kind != RideKind::Request || ride.avail_seats >= 1)
            .filter_map(|ride| {
                let score = self.score(target, ride);
                if score < self.config.min_match_score {
                    return None;
                }
                let (offer_ride_id, request_ride_id) = match target.kind {
                    RideKind::Offer => (target.id.clone(), ride.id.clone()),
                    RideKind::Request => (ride.id.clone(), target.id.clone()),
                };
                Some(RideMatch {
                    offer_ride_id,
                    request_ride_id,
                    score,
                    route_overlap: self.route_overlap(target, ride) * 100.0,
                    time_diff_minutes: time_diff_minutes(target, ride),
                    status: MatchStatus::Suggested,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches
    }
}

fn time_diff_minutes(a: &Ride, b: &Ride) -> f64 {
    let diff = a.departure_time - b.departure_time;
    (diff.num_milliseconds() as f64 / 60_000.0).abs()
}
