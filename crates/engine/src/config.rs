// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Simulation configuration

use crate::being_manager::BeingStrategy;
use palantir_core::PalantiriStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating a [`SimulationConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to build and run one simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of palantiri in the pool
    pub palantiri: usize,
    /// Number of concurrent beings
    pub beings: usize,
    /// Acquire/gaze/release cycles per being
    pub iterations: usize,
    pub palantiri_strategy: PalantiriStrategy,
    pub being_strategy: BeingStrategy,
    /// Shortest gaze
    #[serde(with = "humantime_serde")]
    pub gaze_min: Duration,
    /// Longest gaze
    #[serde(with = "humantime_serde")]
    pub gaze_max: Duration,
    /// How long each shutdown phase waits for beings to finish
    #[serde(with = "humantime_serde")]
    pub shutdown_window: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            palantiri: 6,
            beings: 10,
            iterations: 3,
            palantiri_strategy: PalantiriStrategy::default(),
            being_strategy: BeingStrategy::default(),
            gaze_min: Duration::from_millis(100),
            gaze_max: Duration::from_millis(500),
            shutdown_window: Duration::from_secs(2),
        }
    }
}

impl SimulationConfig {
    /// Parse a config from TOML; omitted fields take their defaults
    ///
    /// Values are not validated here so that overrides can be layered on
    /// first. Call [`validate`](Self::validate) on the final config.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file without validating it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.palantiri == 0 {
            return Err(ConfigError::Invalid("palantiri must be at least 1".to_string()));
        }
        if self.beings == 0 {
            return Err(ConfigError::Invalid("beings must be at least 1".to_string()));
        }
        if self.iterations == 0 {
            return Err(ConfigError::Invalid("iterations must be at least 1".to_string()));
        }
        if self.gaze_min > self.gaze_max {
            return Err(ConfigError::Invalid(format!(
                "gaze_min ({}) exceeds gaze_max ({})",
                humantime::format_duration(self.gaze_min),
                humantime::format_duration(self.gaze_max)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
