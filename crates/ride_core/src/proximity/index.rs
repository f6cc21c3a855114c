//! H3-bucketed candidate index for repeated proximity queries.
//!
//! Candidates are bucketed by H3 cell at insertion time. A query gathers the
//! buckets inside a grid disk that is guaranteed to cover the radius, then
//! applies the exact haversine filter, so results equal
//! [`match_by_proximity`](super::match_by_proximity) over the same candidates
//! in insertion order.

use std::collections::HashMap;

use h3o::{CellIndex, Resolution};
use log::debug;

use super::candidate::{CandidateWithDistance, Located};
use crate::geo::Coordinate;

/// Above this ring count the disk gets more expensive than a linear scan.
const MAX_GRID_DISK_K: u32 = 128;

/// Lower bound on the centre-to-centre step between neighbouring cells,
/// as a fraction of the resolution's average edge length.
const MIN_RING_STEP_EDGES: f64 = 0.5;

/// Slack for a point lying anywhere inside its cell (both query and candidate).
const CELL_SLACK_EDGES: f64 = 3.0;

#[derive(Debug)]
struct Entry<T> {
    candidate: T,
    coordinate: Coordinate,
}

#[derive(Debug)]
pub struct CandidateIndex<T> {
    resolution: Resolution,
    entries: Vec<Entry<T>>,
    by_cell: HashMap<CellIndex, Vec<usize>>,
    skipped: usize,
}

impl<T> CandidateIndex<T> {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            entries: Vec::new(),
            by_cell: HashMap::new(),
            skipped: 0,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of candidates rejected for a missing or invalid coordinate.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_cell.clear();
        self.skipped = 0;
    }

    /// Grid rings needed so the disk around the query cell covers `radius_km`.
    fn rings_for(&self, radius_km: f64) -> Option<u32> {
        let edge_km = self.resolution.edge_length_km();
        let rings =
            ((radius_km + CELL_SLACK_EDGES * edge_km) / (MIN_RING_STEP_EDGES * edge_km)).ceil();
        (rings <= f64::from(MAX_GRID_DISK_K)).then_some(rings as u32)
    }

    fn collect_matches(
        &self,
        origin: &Coordinate,
        max_distance_km: f64,
        slots: impl Iterator<Item = usize>,
    ) -> Vec<CandidateWithDistance<&T>> {
        let mut hits: Vec<(usize, f64)> = slots
            .filter_map(|slot| {
                let distance = origin.distance_km(&self.entries[slot].coordinate);
                (distance <= max_distance_km).then_some((slot, distance))
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits.into_iter()
            .map(|(slot, distance)| CandidateWithDistance {
                candidate: &self.entries[slot].candidate,
                distance_from_origin_km: distance,
            })
            .collect()
    }
}

impl<T: Located> CandidateIndex<T> {
    /// Add a candidate. Returns false (and drops it) when it has no usable
    /// coordinate.
    pub fn insert(&mut self, candidate: T) -> bool {
        let Some(coordinate) = candidate.coordinate().filter(Coordinate::is_valid) else {
            debug!("not indexing candidate without a valid coordinate");
            self.skipped += 1;
            return false;
        };
        let Ok(cell) = coordinate.to_cell(self.resolution) else {
            self.skipped += 1;
            return false;
        };
        let slot = self.entries.len();
        self.entries.push(Entry {
            candidate,
            coordinate,
        });
        self.by_cell.entry(cell).or_default().push(slot);
        true
    }

    /// Candidates within `max_distance_km` (inclusive) of `origin`, nearest
    /// first, ties in insertion order.
    pub fn within(
        &self,
        origin: Coordinate,
        max_distance_km: f64,
    ) -> Vec<CandidateWithDistance<&T>> {
        if self.entries.is_empty() || max_distance_km.is_nan() || max_distance_km < 0.0 {
            return Vec::new();
        }
        let Ok(origin_cell) = origin.to_cell(self.resolution) else {
            return Vec::new();
        };

        match self.rings_for(max_distance_km) {
            Some(k) => {
                let slots = origin_cell
                    .grid_disk::<Vec<_>>(k)
                    .into_iter()
                    .filter_map(|cell| self.by_cell.get(&cell))
                    .flatten()
                    .copied();
                self.collect_matches(&origin, max_distance_km, slots)
            }
            None => self.collect_matches(&origin, max_distance_km, 0..self.entries.len()),
        }
    }

    /// The single nearest candidate within `max_distance_km`.
    pub fn nearest(
        &self,
        origin: Coordinate,
        max_distance_km: f64,
    ) -> Option<CandidateWithDistance<&T>> {
        self.within(origin, max_distance_km).into_iter().next()
    }
}

impl<T: Located> Extend<T> for CandidateIndex<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for candidate in iter {
            self.insert(candidate);
        }
    }
}
