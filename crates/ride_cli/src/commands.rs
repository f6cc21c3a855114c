use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use ride_core::config::RideGeoConfig;
use ride_core::matching::{CompatibilityScorer, Ride};
use ride_core::proximity::{Candidate, ProximityConfig, ProximityMatcher};
use ride_core::routing::build_route_provider;
use ride_core::Coordinate;

pub fn load_config(path: Option<&Path>) -> Result<RideGeoConfig> {
    match path {
        Some(path) => RideGeoConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(RideGeoConfig::default()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn distance(from: Coordinate, to: Coordinate) -> Value {
    json!({
        "from": from,
        "to": to,
        "distance_km": from.distance_km(&to),
    })
}

pub fn route(config: &RideGeoConfig, from: Coordinate, to: Coordinate) -> Result<Value> {
    let provider = build_route_provider(&config.routing);
    let route = provider
        .route(from, to)
        .ok_or_else(|| anyhow!("no route from {from} to {to}"))?;
    Ok(serde_json::to_value(route)?)
}

pub fn match_candidates(
    config: &RideGeoConfig,
    origin: Coordinate,
    candidates_path: &Path,
    radius_km: Option<f64>,
    indexed: bool,
) -> Result<Value> {
    let candidates: Vec<Candidate> = read_json(candidates_path)?;
    let matcher = ProximityMatcher::new(ProximityConfig {
        max_distance_km: radius_km.unwrap_or(config.proximity.max_distance_km),
        ..config.proximity
    });
    info!(
        "matching {} candidates within {} km of {origin}",
        candidates.len(),
        matcher.max_distance_km()
    );

    let matches = if indexed {
        origin.validate()?;
        matcher.config().validate()?;
        let index = matcher.build_index(candidates.iter())?;
        serde_json::to_value(index.within(origin, matcher.max_distance_km()))?
    } else {
        serde_json::to_value(matcher.try_match(origin, candidates.iter().collect())?)?
    };
    Ok(json!({
        "origin": origin,
        "max_distance_km": matcher.max_distance_km(),
        "matches": matches,
    }))
}

pub fn score(config: &RideGeoConfig, rides_path: &Path, ride_id: &str) -> Result<Value> {
    let rides: Vec<Ride> = read_json(rides_path)?;
    let target = rides
        .iter()
        .find(|ride| ride.id == ride_id)
        .with_context(|| format!("ride '{ride_id}' not found in {}", rides_path.display()))?;
    let matches = CompatibilityScorer::new(config.scoring).find_matches_for_ride(target, &rides);
    info!("{} compatible rides for {ride_id}", matches.len());
    Ok(json!({
        "ride_id": ride_id,
        "matches": matches,
    }))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const MG_ROAD: Coordinate = Coordinate::new(12.9716, 77.5946);

    fn json_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    fn candidates_file() -> NamedTempFile {
        json_file(
            r#"[
                {"id": "A", "lat": 12.9698, "lng": 77.7499, "name": "Whitefield"},
                {"id": "B", "lat": 12.9352, "lng": 77.6245, "name": "Koramangala"},
                {"id": "C", "lat": 18.9432, "lng": 72.8236, "name": "Mumbai"},
                {"id": 4, "name": "no position"}
            ]"#,
        )
    }

    fn ids(output: &Value) -> Vec<String> {
        output["matches"]
            .as_array()
            .expect("matches array")
            .iter()
            .map(|m| m["id"].as_str().expect("id").to_string())
            .collect()
    }

    #[test]
    fn distance_reports_kilometres() {
        let output = distance(MG_ROAD, MG_ROAD);
        assert_eq!(output["distance_km"], 0.0);
        assert_eq!(output["from"]["latitude"], 12.9716);
    }

    #[test]
    fn route_uses_curved_provider_by_default() {
        let to = Coordinate::new(12.9352, 77.6245);
        let output = route(&RideGeoConfig::default(), MG_ROAD, to).expect("route");
        assert_eq!(output["waypoints"].as_array().map(Vec::len), Some(3));
        assert!(output["distance_km"].as_f64().expect("distance") > 5.0);
    }

    #[test]
    fn match_linear_and_indexed_agree() {
        let file = candidates_file();
        let config = RideGeoConfig::default();
        let linear = match_candidates(&config, MG_ROAD, file.path(), None, false).expect("linear");
        let indexed = match_candidates(&config, MG_ROAD, file.path(), None, true).expect("indexed");
        assert_eq!(ids(&linear), vec!["B", "A"]);
        assert_eq!(ids(&linear), ids(&indexed));
        assert_eq!(linear["max_distance_km"], 20.0);
        assert_eq!(linear["matches"][0]["name"], "Koramangala");
        assert!(linear["matches"][0]["distance_from_origin"].as_f64().is_some());
    }

    #[test]
    fn radius_flag_overrides_config() {
        let file = candidates_file();
        let output = match_candidates(&RideGeoConfig::default(), MG_ROAD, file.path(), Some(10.0), false)
            .expect("match");
        assert_eq!(ids(&output), vec!["B"]);
        assert_eq!(output["max_distance_km"], 10.0);
    }

    #[test]
    fn negative_radius_is_an_error() {
        let file = candidates_file();
        let config = RideGeoConfig::default();
        assert!(match_candidates(&config, MG_ROAD, file.path(), Some(-1.0), false).is_err());
        assert!(match_candidates(&config, MG_ROAD, file.path(), Some(-1.0), true).is_err());
    }

    #[test]
    fn missing_candidates_file_names_the_path() {
        let err = match_candidates(
            &RideGeoConfig::default(),
            MG_ROAD,
            Path::new("/nonexistent/candidates.json"),
            None,
            false,
        )
        .expect_err("missing file");
        assert!(format!("{err:#}").contains("/nonexistent/candidates.json"));
    }

    #[test]
    fn score_finds_compatible_offers() {
        let file = json_file(
            r#"[
                {"id": "o1", "user_id": "driver", "user_rating": 4.8, "type": "offer",
                 "from": {"lat": 12.9716, "lng": 77.5946}, "to": {"lat": 12.9698, "lng": 77.7499},
                 "departure_time": "2024-03-01T08:30:00Z", "seats": 3, "avail_seats": 2},
                {"id": "r1", "user_id": "seeker", "user_rating": 4.5, "type": "request",
                 "from": {"lat": 12.9720, "lng": 77.5950}, "to": {"lat": 12.9700, "lng": 77.7490},
                 "departure_time": "2024-03-01T08:35:00Z", "seats": 1, "avail_seats": 1}
            ]"#,
        );
        let output = score(&RideGeoConfig::default(), file.path(), "r1").expect("score");
        assert_eq!(output["matches"][0]["offer_ride_id"], "o1");
        assert_eq!(output["matches"][0]["status"], "suggested");

        assert!(score(&RideGeoConfig::default(), file.path(), "missing").is_err());
    }

    #[test]
    fn config_file_is_loaded_and_validated() {
        let good = json_file(r#"{"proximity": {"max_distance_km": 5.0}}"#);
        let config = load_config(Some(good.path())).expect("config");
        assert_eq!(config.proximity.max_distance_km, 5.0);

        let bad = json_file(r#"{"proximity": {"max_distance_km": -5.0}}"#);
        assert!(load_config(Some(bad.path())).is_err());
        assert_eq!(load_config(None).expect("default"), RideGeoConfig::default());
    }
}
