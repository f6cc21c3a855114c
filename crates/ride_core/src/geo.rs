//! Geographic primitives: coordinates and distance calculations.
//!
//! - **Haversine**: great-circle distance in kilometres, used for matching
//! - **Planar**: Euclidean distance in degree space, used only for map visuals
//! - **H3**: conversion of a coordinate to its hexagonal cell for indexing

use std::fmt;
use std::str::FromStr;

use h3o::{CellIndex, LatLng, Resolution};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Construction through [`Coordinate::new`] is unchecked so that the math stays
/// total; use [`Coordinate::try_new`] at boundaries that accept user input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate, rejecting NaN/infinite values and out-of-range degrees.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        let coordinate = Self::new(latitude, longitude);
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Latitude in [-90, 90] and longitude in [-180, 180], both finite.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::invalid_coordinate(self.latitude, self.longitude))
        }
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        distance_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    /// Straight-line distance in degree space, ignoring Earth's curvature.
    pub fn planar_distance(&self, other: &Coordinate) -> f64 {
        let dx = other.longitude - self.longitude;
        let dy = other.latitude - self.latitude;
        (dx * dx + dy * dy).sqrt()
    }

    /// Arithmetic midpoint in degree space.
    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate::new(
            (self.latitude + other.latitude) / 2.0,
            (self.longitude + other.longitude) / 2.0,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// H3 cell containing this coordinate at the given resolution.
    pub fn to_cell(&self, resolution: Resolution) -> Result<CellIndex> {
        self.validate()?;
        let latlng = LatLng::new(self.latitude, self.longitude)
            .map_err(|_| Error::invalid_coordinate(self.latitude, self.longitude))?;
        Ok(latlng.to_cell(resolution))
    }
}

impl From<LatLng> for Coordinate {
    fn from(latlng: LatLng) -> Self {
        Coordinate::new(latlng.lat(), latlng.lng())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Parses `"lat,lon"` (whitespace around either number is ignored).
impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| Error::invalid_config(format!("expected LAT,LON, got '{s}'")))?;
        let latitude = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| Error::invalid_config(format!("bad latitude '{lat}': {e}")))?;
        let longitude = lon
            .trim()
            .parse::<f64>()
            .map_err(|e| Error::invalid_config(format!("bad longitude '{lon}': {e}")))?;
        Coordinate::try_new(latitude, longitude)
    }
}

/// Haversine great-circle distance in kilometres between two lat/lon pairs
/// given in degrees.
///
/// Total over all real inputs: no range validation is performed, and the
/// intermediate `a` term is clamped to `[0, 1]` so rounding near identical or
/// antipodal points cannot produce NaN. Identical points return exactly 0.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let sin_dlat = (d_lat * 0.5).sin();
    let sin_dlon = (d_lon * 0.5).sin();
    let a = sin_dlat * sin_dlat
        + lat1.to_radians().cos() * lat2.to_radians().cos() * sin_dlon * sin_dlon;
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const MG_ROAD: Coordinate = Coordinate::new(12.9716, 77.5946);
    const KORAMANGALA: Coordinate = Coordinate::new(12.9352, 77.6245);

    #[test]
    fn identical_points_are_exactly_zero_apart() {
        assert_eq!(distance_km(12.9716, 77.5946, 12.9716, 77.5946), 0.0);
        assert_eq!(MG_ROAD.distance_km(&MG_ROAD), 0.0);
    }

    #[test]
    fn mg_road_to_koramangala_is_about_five_km() {
        let d = MG_ROAD.distance_km(&KORAMANGALA);
        assert!((d - 4.85).abs() < 0.5, "MG Road -> Koramangala: {d}");
        assert!((d - 5.18).abs() < 0.02, "MG Road -> Koramangala: {d}");
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half_circumference).abs() < 1e-6);

        let poles = distance_km(90.0, 0.0, -90.0, 0.0);
        assert!((poles - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_inputs_still_return_a_number() {
        let d = distance_km(120.0, 400.0, -95.0, -200.0);
        assert!(d.is_finite());
        assert!(d >= 0.0);
    }

    #[test]
    fn try_new_rejects_out_of_range_and_nan() {
        assert!(Coordinate::try_new(12.97, 77.59).is_ok());
        assert!(Coordinate::try_new(90.0, 180.0).is_ok());
        assert!(matches!(
            Coordinate::try_new(90.5, 0.0),
            Err(Error::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::try_new(0.0, -180.01).is_err());
        assert!(Coordinate::try_new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::try_new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn planar_distance_is_euclidean_in_degrees() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(3.0, 4.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn parses_lat_lon_pairs() {
        let parsed: Coordinate = " 12.9716 , 77.5946".parse().expect("coordinate");
        assert_eq!(parsed, MG_ROAD);
        assert!("12.9716".parse::<Coordinate>().is_err());
        assert!("abc,77.0".parse::<Coordinate>().is_err());
        assert!("91.0,77.0".parse::<Coordinate>().is_err());
    }

    #[test]
    fn deserializes_short_field_aliases() {
        let c: Coordinate =
            serde_json::from_str(r#"{"lat": 12.9716, "lng": 77.5946}"#).expect("json");
        assert_eq!(c, MG_ROAD);
    }

    #[test]
    fn to_cell_round_trips_near_the_input() {
        let cell = MG_ROAD.to_cell(Resolution::Nine).expect("cell");
        let center: Coordinate = LatLng::from(cell).into();
        assert!(MG_ROAD.distance_km(&center) < 0.5);
        assert!(Coordinate::new(f64::NAN, 0.0).to_cell(Resolution::Nine).is_err());
    }
}
