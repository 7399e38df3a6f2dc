//! Monitoring configuration
//!
//! Thresholds are fixed when a session is created. A partial JSON document
//! only overrides the keys it names.

use crate::error::ProctorError;
use serde::{Deserialize, Serialize};

/// Default maximum face-center displacement between frames (pixels)
pub const DEFAULT_MOVEMENT_THRESHOLD: f64 = 50.0;

/// Default violation count at which a session becomes medium risk
pub const DEFAULT_VIOLATION_THRESHOLD: u32 = 3;

/// Thresholds used by the detector and aggregator of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProctorConfig {
    /// Movement above this distance between consecutive single-face frames is suspicious
    pub movement_threshold: f64,
    /// Total violations at which the session is medium risk; twice this is high risk
    pub violation_threshold: u32,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
            violation_threshold: DEFAULT_VIOLATION_THRESHOLD,
        }
    }
}

impl ProctorConfig {
    pub fn with_movement_threshold(mut self, threshold: f64) -> Self {
        self.movement_threshold = threshold;
        self
    }

    pub fn with_violation_threshold(mut self, threshold: u32) -> Self {
        self.violation_threshold = threshold;
        self
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, ProctorError> {
        let config: ProctorConfig = serde_json::from_str(json)
            .map_err(|e| ProctorError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ProctorError> {
        check_movement_threshold(self.movement_threshold)?;
        check_violation_threshold(self.violation_threshold)
    }
}

pub(crate) fn check_movement_threshold(threshold: f64) -> Result<(), ProctorError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ProctorError::InvalidConfig(format!(
            "movement_threshold must be a non-negative number, got {threshold}"
        )));
    }
    Ok(())
}

pub(crate) fn check_violation_threshold(threshold: u32) -> Result<(), ProctorError> {
    if threshold == 0 {
        return Err(ProctorError::InvalidConfig(
            "violation_threshold must be at least 1".to_string(),
        ));
    }
    Ok(())
}
