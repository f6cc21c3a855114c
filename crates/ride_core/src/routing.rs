//! Pluggable route providers for map display and trip estimates.
//!
//! Two implementations, selectable via [`RouteProviderKind`]:
//!
//! - **`CurvedRouteProvider`**: three-point bowed polyline + Haversine distance. No I/O.
//! - **`OsrmRouteProvider`** (feature `osrm`): calls a local/remote OSRM HTTP endpoint.
//!
//! Network-backed providers are wrapped in a [`CachedRouteProvider`] that falls
//! back to the curved route when the backend fails.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use log::warn;
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::route::build_curved_route;

/// Average city speed used for duration estimates (km/h).
pub const AVG_CITY_SPEED_KMH: f64 = 40.0;

/// Default route cache capacity.
pub const DEFAULT_ROUTE_CACHE_CAPACITY: usize = 20_000;

/// Public OSRM demo server.
pub const DEFAULT_OSRM_ENDPOINT: &str = "https://router.project-osrm.org";

/// Result of a route query between two coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Polyline to draw, start and end included.
    pub waypoints: Vec<Coordinate>,
    /// Route distance in kilometres.
    pub distance_km: f64,
    /// Free-flow travel time in seconds.
    pub duration_secs: f64,
}

/// Which routing backend to use.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub enum RouteProviderKind {
    /// Curved straight-line approximation, no external dependencies.
    #[default]
    Curved,
    /// OSRM HTTP endpoint (e.g. `"http://localhost:5000"`).
    #[cfg(feature = "osrm")]
    Osrm { endpoint: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub provider: RouteProviderKind,
    pub cache_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            provider: RouteProviderKind::default(),
            cache_capacity: DEFAULT_ROUTE_CACHE_CAPACITY,
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(Error::invalid_config("routing cache_capacity must be > 0"));
        }
        match &self.provider {
            RouteProviderKind::Curved => Ok(()),
            #[cfg(feature = "osrm")]
            RouteProviderKind::Osrm { endpoint } if endpoint.trim().is_empty() => {
                Err(Error::invalid_config("OSRM endpoint must not be empty"))
            }
            #[cfg(feature = "osrm")]
            RouteProviderKind::Osrm { .. } => Ok(()),
        }
    }
}

/// Trait for routing backends. Implementations must be `Send + Sync` so a
/// single provider can serve concurrent map screens.
pub trait RouteProvider: Send + Sync {
    /// Compute a route between two coordinates. Returns `None` if no route exists.
    fn route(&self, from: Coordinate, to: Coordinate) -> Option<RouteResult>;
}

fn estimate_duration_secs(distance_km: f64) -> f64 {
    if distance_km > 0.0 {
        (distance_km / AVG_CITY_SPEED_KMH) * 3600.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Curved provider (always available)
// ---------------------------------------------------------------------------

/// Draws the bowed three-point polyline and estimates distance along the
/// great circle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurvedRouteProvider;

impl RouteProvider for CurvedRouteProvider {
    fn route(&self, from: Coordinate, to: Coordinate) -> Option<RouteResult> {
        if !from.is_valid() || !to.is_valid() {
            return None;
        }
        let distance_km = from.distance_km(&to);
        Some(RouteResult {
            waypoints: build_curved_route(from, to).into_points().to_vec(),
            distance_km,
            duration_secs: estimate_duration_secs(distance_km),
        })
    }
}

// ---------------------------------------------------------------------------
// OSRM provider (behind `osrm` feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "osrm")]
pub mod osrm {
    use super::*;
    use reqwest::blocking::Client;
    use std::time::Duration;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Routes via an OSRM HTTP endpoint.
    pub struct OsrmRouteProvider {
        client: Client,
        endpoint: String,
    }

    impl OsrmRouteProvider {
        pub fn new(endpoint: &str) -> Result<Self> {
            let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
            Ok(Self {
                client,
                endpoint: endpoint.trim_end_matches('/').to_string(),
            })
        }

        fn request_url(&self, from: Coordinate, to: Coordinate) -> String {
            // OSRM takes lon,lat pairs.
            format!(
                "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
                self.endpoint, from.longitude, from.latitude, to.longitude, to.latitude,
            )
        }

        pub fn fetch(&self, from: Coordinate, to: Coordinate) -> Result<RouteResult> {
            let response: OsrmResponse = self
                .client
                .get(self.request_url(from, to))
                .send()?
                .error_for_status()?
                .json()?;
            response.into_route()
        }
    }

    /// Minimal OSRM JSON response structures.
    #[derive(Deserialize)]
    pub(crate) struct OsrmResponse {
        code: String,
        routes: Option<Vec<OsrmRoute>>,
    }

    #[derive(Deserialize)]
    struct OsrmRoute {
        distance: f64, // metres
        duration: f64, // seconds
        geometry: OsrmGeometry,
    }

    #[derive(Deserialize)]
    struct OsrmGeometry {
        coordinates: Vec<Vec<f64>>, // [lng, lat]
    }

    impl OsrmResponse {
        pub(crate) fn into_route(self) -> Result<RouteResult> {
            if self.code != "Ok" {
                return Err(Error::routing(format!("OSRM returned code {}", self.code)));
            }
            let route = self
                .routes
                .and_then(|routes| routes.into_iter().next())
                .ok_or_else(|| Error::routing("OSRM returned no routes"))?;

            let waypoints = route
                .geometry
                .coordinates
                .iter()
                .filter_map(|pair| match pair.as_slice() {
                    [lng, lat, ..] => Some(Coordinate::new(*lat, *lng)),
                    _ => None,
                })
                .collect();

            Ok(RouteResult {
                waypoints,
                distance_km: route.distance / 1000.0,
                duration_secs: route.duration,
            })
        }
    }

    impl RouteProvider for OsrmRouteProvider {
        fn route(&self, from: Coordinate, to: Coordinate) -> Option<RouteResult> {
            self.fetch(from, to)
                .map_err(|err| warn!("OSRM route {from} -> {to} failed: {err}"))
                .ok()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn parses_geojson_route_as_lat_lon() {
            let body = r#"{
                "code": "Ok",
                "routes": [{
                    "distance": 5230.5,
                    "duration": 612.0,
                    "geometry": {"coordinates": [[77.5946, 12.9716], [77.61, 12.95], [77.6245, 12.9352]]}
                }]
            }"#;
            let response: OsrmResponse = serde_json::from_str(body).expect("json");
            let route = response.into_route().expect("route");
            assert_eq!(route.waypoints.len(), 3);
            assert_eq!(route.waypoints[0], Coordinate::new(12.9716, 77.5946));
            assert!((route.distance_km - 5.2305).abs() < 1e-9);
            assert_eq!(route.duration_secs, 612.0);
        }

        #[test]
        fn non_ok_code_is_an_error() {
            let response: OsrmResponse =
                serde_json::from_str(r#"{"code": "NoRoute", "routes": []}"#).expect("json");
            assert!(matches!(response.into_route(), Err(Error::Routing(_))));
        }

        #[test]
        fn request_url_uses_lon_lat_order() {
            let provider = OsrmRouteProvider::new("http://localhost:5000/").expect("client");
            let url = provider.request_url(Coordinate::new(1.5, 2.5), Coordinate::new(3.5, 4.5));
            assert_eq!(
                url,
                "http://localhost:5000/route/v1/driving/2.5,1.5;4.5,3.5?overview=full&geometries=geojson"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Caching wrapper
// ---------------------------------------------------------------------------

type CoordinatePairKey = (u64, u64, u64, u64);

fn cache_key(from: Coordinate, to: Coordinate) -> CoordinatePairKey {
    (
        from.latitude.to_bits(),
        from.longitude.to_bits(),
        to.latitude.to_bits(),
        to.longitude.to_bits(),
    )
}

/// LRU-cached wrapper around any [`RouteProvider`].
///
/// Cache key is the exact bit pattern of both coordinates (directional).
/// On cache miss the inner provider is queried; on inner failure the optional
/// fallback ([`CurvedRouteProvider`]) is tried before returning `None`.
pub struct CachedRouteProvider {
    inner: Box<dyn RouteProvider>,
    cache: Mutex<LruCache<CoordinatePairKey, RouteResult>>,
    fallback_to_curved: bool,
}

impl CachedRouteProvider {
    pub fn new(inner: Box<dyn RouteProvider>, capacity: usize, fallback_to_curved: bool) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            fallback_to_curved,
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl RouteProvider for CachedRouteProvider {
    fn route(&self, from: Coordinate, to: Coordinate) -> Option<RouteResult> {
        let key = cache_key(from, to);

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(cached) = cache.get(&key) {
                return Some(cached.clone());
            }
        }

        let result = self.inner.route(from, to).or_else(|| {
            if self.fallback_to_curved {
                warn!("route {from} -> {to} unavailable, falling back to curved route");
                CurvedRouteProvider.route(from, to)
            } else {
                None
            }
        });

        if let Some(ref route) = result {
            if let Ok(mut cache) = self.cache.lock() {
                cache.put(key, route.clone());
            }
        }

        result
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Construct a boxed [`RouteProvider`] from its config.
///
/// - `Curved` is returned without caching (it is pure and cheap).
/// - `Osrm` is wrapped in a [`CachedRouteProvider`] with curved fallback; if
///   the HTTP client cannot be built, the curved provider is used instead.
pub fn build_route_provider(config: &RoutingConfig) -> Box<dyn RouteProvider> {
    match &config.provider {
        RouteProviderKind::Curved => Box::new(CurvedRouteProvider),

        #[cfg(feature = "osrm")]
        RouteProviderKind::Osrm { endpoint } => match osrm::OsrmRouteProvider::new(endpoint) {
            Ok(provider) => Box::new(CachedRouteProvider::new(
                Box::new(provider),
                config.cache_capacity,
                true,
            )),
            Err(err) => {
                warn!(
                    "failed to build OSRM client for '{endpoint}': {err}. Falling back to curved routes."
                );
                Box::new(CurvedRouteProvider)
            }
        },
    }
}
