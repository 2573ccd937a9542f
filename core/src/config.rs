//! Engine configuration
//!
//! Defaults applied to newly enrolled accounts plus the scheduler
//! cadence. Embeddings that persist configuration can serialize this
//! struct directly.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::errors::{CoreError, CoreResult};
use crate::models::OtpParams;

/// Configuration for the credential engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Code derivation parameters applied to accounts enrolled without
    /// explicit parameters (SHA-1, 6 digits, 30 seconds by default).
    pub default_params: OtpParams,

    /// Wall-clock cadence of the refresh scheduler, in milliseconds.
    pub tick_millis: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_params: OtpParams::default(),
            tick_millis: 1_000,
        }
    }
}

impl EngineConfig {
    /// Check that the configuration is usable.
    pub fn validate(&self) -> CoreResult<()> {
        if let Err(e) = self.default_params.validate() {
            return Err(CoreError::Validation {
                message: format!("default parameters: {e}"),
            });
        }
        if self.tick_millis == 0 {
            return Err(CoreError::Validation {
                message: "tick interval must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Scheduler tick cadence as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}
