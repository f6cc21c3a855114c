use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ride_core::proximity::Candidate;
use ride_core::Coordinate;

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform coordinate over the whole valid lat/lon range.
pub fn random_coordinate(rng: &mut StdRng) -> Coordinate {
    Coordinate::new(rng.gen_range(-90.0..=90.0), rng.gen_range(-180.0..=180.0))
}

/// Coordinate within roughly `spread_deg` degrees of `center`.
pub fn random_coordinate_near(
    rng: &mut StdRng,
    center: Coordinate,
    spread_deg: f64,
) -> Coordinate {
    Coordinate::new(
        (center.latitude + rng.gen_range(-spread_deg..=spread_deg)).clamp(-90.0, 90.0),
        (center.longitude + rng.gen_range(-spread_deg..=spread_deg)).clamp(-180.0, 180.0),
    )
}

pub fn random_candidates(
    rng: &mut StdRng,
    center: Coordinate,
    spread_deg: f64,
    count: usize,
) -> Vec<Candidate> {
    (0..count)
        .map(|i| {
            let coordinate = random_coordinate_near(rng, center, spread_deg);
            Candidate::new(format!("cand-{i}"), coordinate)
        })
        .collect()
}
