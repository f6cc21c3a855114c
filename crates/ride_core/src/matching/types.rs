use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::proximity::Located;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideKind {
    Offer,
    Request,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    #[default]
    Available,
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// A ride offer (driver with seats) or request (seeker needing a seat).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    /// 0–5 stars.
    pub user_rating: f64,
    #[serde(rename = "type")]
    pub kind: RideKind,
    pub from: Coordinate,
    #[serde(default)]
    pub from_address: String,
    pub to: Coordinate,
    #[serde(default)]
    pub to_address: String,
    pub departure_time: DateTime<Utc>,
    pub seats: u32,
    /// Seats left after accepted bookings.
    pub avail_seats: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub status: RideStatus,
}

impl Ride {
    pub fn is_available(&self) -> bool {
        self.status == RideStatus::Available
    }
}

/// Rides are located at their pickup point.
impl Located for Ride {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(self.from)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Suggested,
    Accepted,
    Rejected,
}

/// A suggested pairing of one offer with one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideMatch {
    pub offer_ride_id: String,
    pub request_ride_id: String,
    /// 0–100.
    pub score: f64,
    /// Route overlap as a percentage, 0–100.
    pub route_overlap: f64,
    pub time_diff_minutes: f64,
    pub status: MatchStatus,
}
