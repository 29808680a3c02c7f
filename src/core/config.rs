//! Engine configuration with documented defaults
//!
//! All scheduling knobs live here. Model constants (war cost, victory
//! thresholds, event damping) sit next to the code that uses them.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};

/// Fastest allowed speed multiplier
pub const MAX_SPEED: f64 = 8.0;

/// Longest effective tick interval (one day), whatever the speed
pub const MAX_TICK_INTERVAL_MS: f64 = 86_400_000.0;

/// Configuration for a [`crate::engine::SimulationEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === SCHEDULING ===
    /// Base time between ticks at 1x speed (milliseconds)
    ///
    /// The effective interval is `update_interval_ms / speed`, so the
    /// default of 5000 becomes 2500 at 2x and 625 at 8x.
    pub update_interval_ms: f64,

    /// Delay between one conflict ending and the next being created
    /// when `auto_advance` is on (milliseconds, not speed-scaled)
    pub next_conflict_delay_ms: u64,

    /// Create a fresh conflict automatically after a victory
    pub auto_advance: bool,

    // === EVENTS ===
    /// Chance per tick that a random event is generated
    ///
    /// At 0.3, roughly one tick in three carries an event. Must be in [0, 1].
    pub event_probability: f64,

    /// Seed for the engine RNG; entropy-seeded when absent
    pub seed: Option<u64>,

    // === HOUSEKEEPING ===
    /// Run history trimming every N processed ticks
    pub housekeeping_interval_ticks: u64,

    /// Maximum timeline entries retained on the live conflict
    ///
    /// The `conflict_start` entry is always kept, so the effective
    /// minimum is 1.
    pub max_timeline_events: usize,

    /// Maximum finished-conflict summaries retained by the engine
    pub max_conflict_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 5000.0,
            next_conflict_delay_ms: 3000,
            auto_advance: true,

            event_probability: 0.3,
            seed: None,

            housekeeping_interval_ticks: 50,
            max_timeline_events: 200,
            max_conflict_history: 50,
        }
    }
}

impl From<u64> for EngineConfig {
    /// Raw tick interval in milliseconds, all other settings default
    fn from(update_interval_ms: u64) -> Self {
        Self {
            update_interval_ms: update_interval_ms as f64,
            ..Self::default()
        }
    }
}

impl From<f64> for EngineConfig {
    fn from(update_interval_ms: f64) -> Self {
        Self {
            update_interval_ms,
            ..Self::default()
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file; missing keys take their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), EngineError> {
        self.tick_interval(1.0)?;

        if !(0.0..=1.0).contains(&self.event_probability) {
            return Err(EngineError::InvalidConfig(format!(
                "event_probability ({}) must be within [0, 1]",
                self.event_probability
            )));
        }

        if self.next_conflict_delay_ms as f64 > MAX_TICK_INTERVAL_MS {
            return Err(EngineError::InvalidConfig(format!(
                "next_conflict_delay_ms ({}) must not exceed one day",
                self.next_conflict_delay_ms
            )));
        }

        if self.housekeeping_interval_ticks == 0 {
            return Err(EngineError::InvalidConfig(
                "housekeeping_interval_ticks must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Effective tick period at `speed`.
    ///
    /// Fails when the period is not a positive duration of at most
    /// [`MAX_TICK_INTERVAL_MS`].
    pub fn tick_interval(&self, speed: f64) -> std::result::Result<Duration, EngineError> {
        let interval_ms = self.update_interval_ms / speed;
        if !(interval_ms > 0.0 && interval_ms <= MAX_TICK_INTERVAL_MS) {
            return Err(EngineError::InvalidInterval(interval_ms));
        }
        Duration::try_from_secs_f64(interval_ms / 1000.0)
            .ok()
            .filter(|period| !period.is_zero())
            .ok_or(EngineError::InvalidInterval(interval_ms))
    }
}
