//! Location tracking state: tracking flags, listeners and update throttling,
//! owned by one [`LocationTracker`] instead of process-wide globals.
//!
//! Time comes from an injected [`Clock`], so throttling is deterministic in
//! tests ([`ManualClock`]) and wall-clock based in the app ([`SystemClock`]).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Minimum spacing between delivered fixes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingOptions {
    pub time_interval_ms: u64,
    pub distance_interval_m: f64,
}

impl Default for TrackingOptions {
    fn default() -> Self {
        Self {
            time_interval_ms: 5_000,
            distance_interval_m: 10.0,
        }
    }
}

impl TrackingOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.distance_interval_m.is_finite() || self.distance_interval_m < 0.0 {
            return Err(Error::invalid_config(format!(
                "distance_interval_m must be >= 0, got {}",
                self.distance_interval_m
            )));
        }
        Ok(())
    }
}

/// A raw position report from the device location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
}

impl LocationReading {
    pub fn at(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            accuracy_m: None,
            speed_mps: None,
            heading_deg: None,
        }
    }
}

/// A reading accepted by the tracker and delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub timestamp_ms: u64,
    pub is_active_trip: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&LocationFix) + Send>;

pub struct LocationTracker<C: Clock> {
    clock: C,
    options: TrackingOptions,
    tracking: bool,
    active_trip: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    last_fix: Option<LocationFix>,
}

impl<C: Clock> LocationTracker<C> {
    pub fn new(clock: C, options: TrackingOptions) -> Self {
        Self {
            clock,
            options,
            tracking: false,
            active_trip: false,
            listeners: Vec::new(),
            next_listener: 0,
            last_fix: None,
        }
    }

    pub fn options(&self) -> &TrackingOptions {
        &self.options
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn is_active_trip(&self) -> bool {
        self.active_trip
    }

    pub fn last_fix(&self) -> Option<&LocationFix> {
        self.last_fix.as_ref()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Begin accepting readings. Returns false if already tracking, leaving the
    /// current session untouched.
    pub fn start(&mut self, active_trip: bool) -> bool {
        if self.tracking {
            info!("location tracking already running");
            return false;
        }
        self.tracking = true;
        self.active_trip = active_trip;
        self.last_fix = None;
        info!("location tracking started (active trip: {active_trip})");
        true
    }

    /// Stop accepting readings. Listeners stay subscribed for the next session.
    pub fn stop(&mut self) {
        if self.tracking {
            info!("location tracking stopped");
        }
        self.tracking = false;
        self.active_trip = false;
        self.last_fix = None;
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&LocationFix) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Whether a reading at `coordinate` and `now_ms` is far enough, in both
    /// time and space, from the last delivered fix.
    fn is_due(&self, coordinate: &Coordinate, now_ms: u64) -> bool {
        let Some(last) = &self.last_fix else {
            return true;
        };
        let elapsed_ms = now_ms.saturating_sub(last.timestamp_ms);
        let moved_m = last.coordinate.distance_km(coordinate) * 1000.0;
        elapsed_ms >= self.options.time_interval_ms && moved_m >= self.options.distance_interval_m
    }

    /// Offer a reading from the location provider.
    ///
    /// Returns the delivered fix, or `None` when not tracking or when the
    /// reading is throttled. Invalid coordinates are rejected.
    pub fn ingest(&mut self, reading: LocationReading) -> Result<Option<LocationFix>> {
        reading.coordinate.validate()?;
        if !self.tracking {
            return Ok(None);
        }

        let now_ms = self.clock.now_ms();
        if !self.is_due(&reading.coordinate, now_ms) {
            debug!("throttled location reading at {}", reading.coordinate);
            return Ok(None);
        }

        let fix = LocationFix {
            coordinate: reading.coordinate,
            accuracy_m: reading.accuracy_m,
            speed_mps: reading.speed_mps,
            heading_deg: reading.heading_deg,
            timestamp_ms: now_ms,
            is_active_trip: self.active_trip,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&fix);
        }
        self.last_fix = Some(fix);
        Ok(Some(fix))
    }
}
