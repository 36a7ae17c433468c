//! Tunable constants of the arena geometry and the hazard model.
//! Every field has a default matching the live game server, so an empty
//! TOML document is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Edge length of one grid cell in pixels.
    pub tile_size: f64,
    /// Edge length of an agent's square footprint in pixels.
    pub agent_size: f64,
    /// Blast range assumed for explosives whose owner is unknown.
    pub default_blast_range: u8,
    pub severity: SeverityThresholds,
    /// Step horizon of the post-placement escape search.
    pub escape_depth: u32,
    /// Chebyshev radius, in cells, of the reachable-item query.
    pub item_reach: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tile_size: 40.0,
            agent_size: 35.0,
            default_blast_range: 2,
            severity: SeverityThresholds::default(),
            escape_depth: 6,
            item_reach: 6,
        }
    }
}

/// Countdown boundaries, in milliseconds, between the four severity tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    pub critical_below_ms: u64,
    pub high_below_ms: u64,
    pub elevated_below_ms: u64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self { critical_below_ms: 1400, high_below_ms: 1900, elevated_below_ms: 2900 }
    }
}

impl ArenaConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(ConfigError::Invalid { field: "tile_size", reason: "must be positive" });
        }
        if !self.agent_size.is_finite() || self.agent_size <= 0.0 {
            return Err(ConfigError::Invalid { field: "agent_size", reason: "must be positive" });
        }
        let s = self.severity;
        if !(s.critical_below_ms < s.high_below_ms && s.high_below_ms < s.elevated_below_ms) {
            return Err(ConfigError::Invalid {
                field: "severity",
                reason: "thresholds must be strictly increasing",
            });
        }
        Ok(())
    }
}
