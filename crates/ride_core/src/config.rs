//! Top-level configuration, loadable from JSON.
//!
//! Every section is optional in the file; missing keys take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matching::ScoringConfig;
use crate::proximity::ProximityConfig;
use crate::routing::RoutingConfig;
use crate::tracking::TrackingOptions;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideGeoConfig {
    pub proximity: ProximityConfig,
    pub scoring: ScoringConfig,
    pub tracking: TrackingOptions,
    pub routing: RoutingConfig,
}

impl RideGeoConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.proximity.validate()?;
        self.scoring.validate()?;
        self.tracking.validate()?;
        self.routing.validate()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
