//! Planner tuning knobs, loadable from YAML.
//!
//! Lookup order: `./stepwise.yaml` in the working directory, then
//! `~/.stepwise/config.yaml`, then built-in defaults. Every field is
//! optional in the file; absent fields keep their default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Consecutive execution failures tolerated before the run aborts.
    pub max_retries: usize,
    /// Loop-detection window: issuing the same (type, locator, value)
    /// this many times in a row is treated as a loop.
    pub loop_window: usize,
    /// First WAIT timeout in milliseconds; doubles on each consecutive
    /// wait.
    pub wait_base_ms: u64,
    /// Upper bound on any single WAIT timeout.
    pub wait_cap_ms: u64,
    /// Hard cap on total history length before the run aborts.
    pub max_steps: usize,
    /// Swipe gesture duration in milliseconds.
    pub swipe_duration_ms: u64,
    /// Enable the lowest-priority fuzzy text matching tier.
    pub fuzzy_matching: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            max_retries: 3,
            loop_window: 3,
            wait_base_ms: 1000,
            wait_cap_ms: 8000,
            max_steps: 50,
            swipe_duration_ms: 500,
            fuzzy_matching: false,
        }
    }
}

impl PlannerConfig {
    /// Load from the standard lookup locations, falling back to defaults
    /// when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.is_file() {
                return Self::load_from(&path);
            }
        }
        Ok(PlannerConfig::default())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("stepwise.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".stepwise").join("config.yaml"));
        }
        paths
    }
}
