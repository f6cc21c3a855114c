//! Curved three-point polylines for map display.
//!
//! The bend is computed in degree space on purpose: it is a visual cue, and
//! the map styling was tuned around this magnitude.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Fraction of the start→end planar length used as the perpendicular bow.
pub const CURVE_OFFSET_RATIO: f64 = 0.15;

/// Planar lengths at or below this are treated as a single point.
pub const DEGENERATE_EPSILON: f64 = 1e-12;

/// Start, offset midpoint and end, in drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePolyline([Coordinate; 3]);

impl RoutePolyline {
    pub fn start(&self) -> Coordinate {
        self.0[0]
    }

    /// The offset midpoint that gives the line its curve.
    pub fn bend(&self) -> Coordinate {
        self.0[1]
    }

    pub fn end(&self) -> Coordinate {
        self.0[2]
    }

    pub fn points(&self) -> &[Coordinate; 3] {
        &self.0
    }

    pub fn into_points(self) -> [Coordinate; 3] {
        self.0
    }

    /// True when the bend sits exactly on the start→end midpoint.
    pub fn is_straight(&self) -> bool {
        self.bend() == self.start().midpoint(&self.end())
    }
}

/// Build a polyline from `start` to `end` that bows to one side of the
/// straight segment by [`CURVE_OFFSET_RATIO`] of its planar length.
///
/// When `start` and `end` coincide the bend collapses onto the midpoint, so
/// no field is ever NaN for finite input.
pub fn build_curved_route(start: Coordinate, end: Coordinate) -> RoutePolyline {
    let mid = start.midpoint(&end);
    let dx = end.longitude - start.longitude;
    let dy = end.latitude - start.latitude;
    let dist = (dx * dx + dy * dy).sqrt();

    if dist <= DEGENERATE_EPSILON {
        return RoutePolyline([start, mid, end]);
    }

    let offset = dist * CURVE_OFFSET_RATIO;
    let bend = Coordinate::new(
        mid.latitude - offset * dx / dist,
        mid.longitude + offset * dy / dist,
    );
    RoutePolyline([start, bend, end])
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Perpendicular distance of `p` from the infinite line through `a` and `b`
    /// in (lon, lat) degree space.
    fn distance_from_line(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
        let dx = b.longitude - a.longitude;
        let dy = b.latitude - a.latitude;
        let cross = dx * (p.latitude - a.latitude) - dy * (p.longitude - a.longitude);
        cross.abs() / (dx * dx + dy * dy).sqrt()
    }

    #[test]
    fn same_point_yields_three_identical_points() {
        let p = Coordinate::new(12.9716, 77.5946);
        let route = build_curved_route(p, p);
        assert_eq!(route.into_points(), [p, p, p]);
        assert!(route.is_straight());
        assert!(route.points().iter().all(Coordinate::is_finite));
    }

    #[test]
    fn bend_is_offset_by_fifteen_percent_of_planar_length() {
        let start = Coordinate::new(12.9716, 77.5946);
        let end = Coordinate::new(12.9698, 77.7499);
        let route = build_curved_route(start, end);

        let planar = start.planar_distance(&end);
        let offset = distance_from_line(route.bend(), start, end);
        assert!((offset - CURVE_OFFSET_RATIO * planar).abs() < 1e-12);
        assert!(!route.is_straight());
        assert_eq!(route.start(), start);
        assert_eq!(route.end(), end);
    }

    #[test]
    fn bend_projects_onto_the_segment_midpoint() {
        let start = Coordinate::new(0.0, 0.0);
        let end = Coordinate::new(0.0, 10.0);
        let route = build_curved_route(start, end);
        // dx = 10, dy = 0: the bend moves south of the midpoint by 1.5 degrees
        assert!((route.bend().latitude + 1.5).abs() < 1e-12);
        assert!((route.bend().longitude - 5.0).abs() < 1e-12);
    }

    #[test]
    fn reversing_direction_bows_to_the_other_side() {
        let a = Coordinate::new(10.0, 20.0);
        let b = Coordinate::new(11.0, 22.0);
        let forward = build_curved_route(a, b).bend();
        let backward = build_curved_route(b, a).bend();
        let mid = a.midpoint(&b);
        assert!((forward.latitude - mid.latitude + backward.latitude - mid.latitude).abs() < 1e-12);
        assert!((forward.longitude - mid.longitude + backward.longitude - mid.longitude).abs() < 1e-12);
    }

    #[test]
    fn serializes_as_a_plain_array_of_points() {
        let route = build_curved_route(Coordinate::new(1.0, 1.0), Coordinate::new(1.0, 1.0));
        let json = serde_json::to_value(route).expect("json");
        assert_eq!(json.as_array().map(Vec::len), Some(3));
    }
}
