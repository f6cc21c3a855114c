//! Proximity matching: filter ride candidates by haversine radius and order
//! them nearest first.
//!
//! Candidates with a missing or invalid coordinate are skipped (and logged at
//! debug level), never reported as errors. The caller must not mutate the
//! candidate collection from another thread while a match is running.

pub mod candidate;
pub mod index;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

pub use candidate::{Candidate, CandidateWithDistance, Located};
pub use index::CandidateIndex;

/// Radius used by the matches screen when the caller does not choose one.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 20.0;

/// Candidate count at which [`ProximityMatcher`] switches to the parallel path.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// Default H3 resolution for [`CandidateIndex`] (~1.4 km edges).
pub const DEFAULT_INDEX_RESOLUTION: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Inclusive matching radius in kilometres.
    pub max_distance_km: f64,
    pub parallel_threshold: usize,
    pub index_resolution: u8,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            index_resolution: DEFAULT_INDEX_RESOLUTION,
        }
    }
}

impl ProximityConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.max_distance_km.is_finite() || self.max_distance_km < 0.0 {
            return Err(Error::InvalidRadius(self.max_distance_km));
        }
        if h3o::Resolution::try_from(self.index_resolution).is_err() {
            return Err(Error::invalid_config(format!(
                "index_resolution must be 0..=15, got {}",
                self.index_resolution
            )));
        }
        Ok(())
    }
}

/// Distance from `origin` to `candidate`, or `None` when the candidate has no
/// usable coordinate.
fn distance_from(origin: &Coordinate, candidate: &impl Located) -> Option<f64> {
    match candidate.coordinate() {
        Some(coordinate) if coordinate.is_valid() => Some(origin.distance_km(&coordinate)),
        Some(coordinate) => {
            debug!("skipping candidate with invalid coordinate {coordinate}");
            None
        }
        None => {
            debug!("skipping candidate without coordinate");
            None
        }
    }
}

fn sort_nearest_first<T>(matched: &mut [CandidateWithDistance<T>]) {
    // `sort_by` is stable: equal distances keep their input order.
    matched.sort_by(|a, b| a.distance_from_origin_km.total_cmp(&b.distance_from_origin_km));
}

/// Keep candidates within `max_distance_km` (inclusive) of `origin`, nearest
/// first. Ties keep their input order.
///
/// An empty input, a negative or NaN radius, or an invalid origin all yield an
/// empty result. A radius of 0 still matches candidates at the origin itself.
pub fn match_by_proximity<I, T>(
    origin: Coordinate,
    candidates: I,
    max_distance_km: f64,
) -> Vec<CandidateWithDistance<T>>
where
    I: IntoIterator<Item = T>,
    T: Located,
{
    if !origin.is_valid() {
        warn!("proximity match requested from invalid origin {origin}");
        return Vec::new();
    }

    let mut matched: Vec<_> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = distance_from(&origin, &candidate)?;
            (distance <= max_distance_km).then_some(CandidateWithDistance {
                candidate,
                distance_from_origin_km: distance,
            })
        })
        .collect();

    sort_nearest_first(&mut matched);
    matched
}

/// Parallel variant of [`match_by_proximity`] with identical output.
///
/// The rayon collect preserves input order and `par_sort_by` is stable, so
/// ties resolve exactly as in the sequential version.
pub fn par_match_by_proximity<T>(
    origin: Coordinate,
    candidates: Vec<T>,
    max_distance_km: f64,
) -> Vec<CandidateWithDistance<T>>
where
    T: Located + Send,
{
    if !origin.is_valid() {
        warn!("proximity match requested from invalid origin {origin}");
        return Vec::new();
    }

    let mut matched: Vec<_> = candidates
        .into_par_iter()
        .filter_map(|candidate| {
            let distance = distance_from(&origin, &candidate)?;
            (distance <= max_distance_km).then_some(CandidateWithDistance {
                candidate,
                distance_from_origin_km: distance,
            })
        })
        .collect();

    matched.par_sort_by(|a, b| a.distance_from_origin_km.total_cmp(&b.distance_from_origin_km));
    matched
}

/// Configured matcher: fixed radius plus the switch to the parallel path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityMatcher {
    config: ProximityConfig,
}

impl ProximityMatcher {
    pub fn new(config: ProximityConfig) -> Self {
        Self { config }
    }

    pub fn with_max_distance_km(max_distance_km: f64) -> Self {
        Self::new(ProximityConfig {
            max_distance_km,
            ..ProximityConfig::default()
        })
    }

    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    pub fn max_distance_km(&self) -> f64 {
        self.config.max_distance_km
    }

    /// Permissive match; see [`match_by_proximity`].
    pub fn match_candidates<T>(
        &self,
        origin: Coordinate,
        candidates: Vec<T>,
    ) -> Vec<CandidateWithDistance<T>>
    where
        T: Located + Send,
    {
        if candidates.len() >= self.config.parallel_threshold {
            par_match_by_proximity(origin, candidates, self.config.max_distance_km)
        } else {
            match_by_proximity(origin, candidates, self.config.max_distance_km)
        }
    }

    /// Validating match: rejects an invalid origin or radius instead of
    /// returning an empty list.
    pub fn try_match<T>(
        &self,
        origin: Coordinate,
        candidates: Vec<T>,
    ) -> Result<Vec<CandidateWithDistance<T>>>
    where
        T: Located + Send,
    {
        origin.validate()?;
        self.config.validate()?;
        Ok(self.match_candidates(origin, candidates))
    }

    /// Index `candidates` at the configured resolution for repeated queries.
    pub fn build_index<I, T>(&self, candidates: I) -> Result<CandidateIndex<T>>
    where
        I: IntoIterator<Item = T>,
        T: Located,
    {
        let resolution = h3o::Resolution::try_from(self.config.index_resolution).map_err(|_| {
            Error::invalid_config(format!(
                "index_resolution must be 0..=15, got {}",
                self.config.index_resolution
            ))
        })?;
        let mut index = CandidateIndex::new(resolution);
        index.extend(candidates);
        Ok(index)
    }
}
