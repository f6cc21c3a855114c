use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geo::Coordinate;

/// Anything that can be placed on the map for proximity matching.
///
/// `None` means the position is unknown; such candidates are skipped.
pub trait Located {
    fn coordinate(&self) -> Option<Coordinate>;
}

impl<T: Located + ?Sized> Located for &T {
    fn coordinate(&self) -> Option<Coordinate> {
        (**self).coordinate()
    }
}

impl Located for Coordinate {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(*self)
    }
}

/// Serde helper: accept ids sent either as JSON strings or numbers.
mod id_serde {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        match Value::deserialize(de)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "candidate id must be a string or number, got {other}"
            ))),
        }
    }
}

/// A ride listing as returned by the trip service: an id, an optional
/// position and whatever else the listing carries (name, route, price...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(deserialize_with = "id_serde::deserialize")]
    pub id: String,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lng", alias = "lon")]
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            latitude: Some(coordinate.latitude),
            longitude: Some(coordinate.longitude),
            payload: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

impl Located for Candidate {
    fn coordinate(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.latitude?, self.longitude?))
    }
}

/// A matched candidate together with its great-circle distance from the
/// origin. Serializes as the candidate's own fields plus
/// `distance_from_origin`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateWithDistance<T> {
    #[serde(flatten)]
    pub candidate: T,
    #[serde(rename = "distance_from_origin")]
    pub distance_from_origin_km: f64,
}
