use ride_core::matching::{CompatibilityScorer, Ride, RideKind, ScoringConfig};
use ride_core::proximity::match_by_proximity;
use ride_core::test_helpers::MG_ROAD;

const RIDES_JSON: &str = r#"[
    {"id": "o1", "user_id": "rajesh", "user_name": "Rajesh Kumar", "user_rating": 4.8, "type": "offer",
     "from": {"lat": 12.9716, "lng": 77.5946}, "to": {"lat": 12.9698, "lng": 77.7499},
     "departure_time": "2024-03-01T08:30:00Z", "seats": 3, "avail_seats": 2, "price": 120},
    {"id": "o2", "user_id": "priya", "user_name": "Priya Sharma", "user_rating": 4.9, "type": "offer",
     "from": {"lat": 12.9750, "lng": 77.6000}, "to": {"lat": 12.9650, "lng": 77.7400},
     "departure_time": "2024-03-01T09:00:00Z", "seats": 2, "avail_seats": 1, "price": 100},
    {"id": "o3", "user_id": "amit", "user_name": "Amit Patel", "user_rating": 4.6, "type": "offer",
     "from": {"lat": 12.9352, "lng": 77.6245}, "to": {"lat": 12.9698, "lng": 77.7499},
     "departure_time": "2024-03-01T08:30:00Z", "seats": 4, "avail_seats": 3, "price": 90},
    {"id": "o4", "user_id": "sneha", "user_name": "Sneha Reddy", "user_rating": 5.0, "type": "offer",
     "from": {"lat": 12.9716, "lng": 77.5946}, "to": {"lat": 12.9698, "lng": 77.7499},
     "departure_time": "2024-03-01T08:30:00Z", "seats": 1, "avail_seats": 0, "price": 150},
    {"id": "r1", "user_id": "seeker", "user_name": "Seeker", "user_rating": 4.5, "type": "request",
     "from": {"lat": 12.9720, "lng": 77.5950}, "to": {"lat": 12.9700, "lng": 77.7490},
     "departure_time": "2024-03-01T08:35:00Z", "seats": 1, "avail_seats": 1}
]"#;

fn rides() -> Vec<Ride> {
    serde_json::from_str(RIDES_JSON).expect("rides fixture")
}

fn find(rides: &[Ride], id: &str) -> Ride {
    rides.iter().find(|ride| ride.id == id).cloned().expect("ride in fixture")
}

#[test]
fn request_is_matched_to_nearby_offers_best_first() {
    let rides = rides();
    let request = find(&rides, "r1");
    let matches = CompatibilityScorer::default().find_matches_for_ride(&request, &rides);

    let offers: Vec<&str> = matches.iter().map(|m| m.offer_ride_id.as_str()).collect();
    // o3's pickup is ~5 km away (route overlap 0); o4 has no free seat.
    assert_eq!(offers, vec!["o1", "o2"]);
    assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(matches.iter().all(|m| m.score >= 70.0 && m.score <= 100.0));
    assert_eq!(matches[1].time_diff_minutes, 25.0);
}

#[test]
fn lower_threshold_admits_weaker_matches() {
    let rides = rides();
    let request = find(&rides, "r1");
    let scorer = CompatibilityScorer::new(ScoringConfig {
        min_match_score: 40.0,
        ..ScoringConfig::default()
    });
    let matches = scorer.find_matches_for_ride(&request, &rides);
    let offers: Vec<&str> = matches.iter().map(|m| m.offer_ride_id.as_str()).collect();
    assert!(offers.contains(&"o3"));
    assert!(!offers.contains(&"o4"));
}

#[test]
fn offer_side_sees_the_request() {
    let rides = rides();
    let offer = find(&rides, "o1");
    let matches = CompatibilityScorer::default().find_matches_for_ride(&offer, &rides);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].offer_ride_id, "o1");
    assert_eq!(matches[0].request_ride_id, "r1");
    assert!(matches[0].route_overlap > 90.0);
}

#[test]
fn rides_can_be_filtered_by_pickup_proximity() {
    let rides = rides();
    let offers: Vec<&Ride> = rides.iter().filter(|r| r.kind == RideKind::Offer).collect();
    let nearby = match_by_proximity(MG_ROAD, offers, 2.0);
    let ids: Vec<&str> = nearby.iter().map(|m| m.candidate.id.as_str()).collect();
    // Stable: o1 and o4 share a pickup at MG Road.
    assert_eq!(ids, vec!["o1", "o4", "o2"]);
}
