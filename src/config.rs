// src/config.rs

//! Run configuration for the protocol driver.

use crate::core::QkdError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Job polling behaviour: check every `interval_ms`, give up after `max_polls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Milliseconds to sleep between status checks. Zero never sleeps.
    pub interval_ms: u64,
    /// Number of status checks before the wait is abandoned.
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 10_000, max_polls: 30 }
    }
}

impl PollConfig {
    /// Sleep between status checks.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Settings for one protocol run.
///
/// Every field has a default, so a JSON file only needs the fields it changes:
///
/// ```
/// let config = e91::ProtocolConfig::from_json_str(r#"{ "singlets": 50, "eavesdropper": true }"#).unwrap();
/// assert_eq!(config.singlets, 50);
/// assert!(config.eavesdropper);
/// assert_eq!(config.batch_size, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Number of singlet pairs (trials).
    pub singlets: usize,
    /// Insert Eve's intercept-resend measurement into every trial.
    pub eavesdropper: bool,
    /// Seed for basis choices and measurement outcomes.
    pub seed: Option<u64>,
    /// Most circuits submitted in one job.
    pub batch_size: usize,
    /// Job polling.
    pub poll: PollConfig,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            singlets: 500,
            eavesdropper: false,
            seed: None,
            batch_size: 100,
            poll: PollConfig::default(),
        }
    }
}

impl ProtocolConfig {
    /// Parses a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, QkdError> {
        let config: Self = serde_json::from_str(json).map_err(|e| QkdError::Config {
            message: format!("invalid JSON: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, QkdError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| QkdError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&text)
    }

    /// Applies command-line values on top of this configuration. `None`
    /// (or `false` for `eavesdropper`) keeps the current value.
    pub fn with_overrides(
        mut self,
        singlets: Option<usize>,
        eavesdropper: bool,
        seed: Option<u64>,
        batch_size: Option<usize>,
    ) -> Self {
        if let Some(n) = singlets {
            self.singlets = n;
        }
        if eavesdropper {
            self.eavesdropper = true;
        }
        if seed.is_some() {
            self.seed = seed;
        }
        if let Some(n) = batch_size {
            self.batch_size = n;
        }
        self
    }

    /// Seed for the backend's measurement stream, derived from `seed` so the
    /// settings stream and the outcome stream differ.
    pub fn backend_seed(&self) -> Option<u64> {
        self.seed.map(|s| s.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1))
    }

    /// Rejects settings the driver cannot run with.
    pub fn validate(&self) -> Result<(), QkdError> {
        if self.singlets == 0 {
            return Err(QkdError::Config { message: "singlets must be at least 1".to_string() });
        }
        if self.batch_size == 0 {
            return Err(QkdError::Config { message: "batch_size must be at least 1".to_string() });
        }
        if self.poll.max_polls == 0 {
            return Err(QkdError::Config { message: "poll.max_polls must be at least 1".to_string() });
        }
        Ok(())
    }
}
