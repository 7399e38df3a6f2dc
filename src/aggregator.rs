//! Session-level risk aggregation
//!
//! Reduces a session's violation events to a [`SessionReport`]. The result
//! depends only on the event counts per type, so event order is irrelevant
//! and re-running on a longer prefix of the same session never lowers the
//! suspicion level.

use crate::config::{check_violation_threshold, DEFAULT_VIOLATION_THRESHOLD};
use crate::error::ProctorError;
use crate::types::{SessionReport, SuspicionLevel, ViolationEvent, ViolationType};
use std::collections::BTreeMap;

pub const RECOMMEND_LIGHTING: &str = "Ensure proper lighting and camera positioning";
pub const RECOMMEND_SINGLE_OCCUPANT: &str = "Ensure only the candidate is present in the frame";
pub const RECOMMEND_FEWER_APP_SWITCHES: &str =
    "Minimize switching between applications during the assessment";

/// `face_not_detected` count above which lighting advice is given
const FACE_NOT_DETECTED_LIMIT: u32 = 2;

/// `multiple_faces` count above which occupancy advice is given
const MULTIPLE_FACES_LIMIT: u32 = 0;

/// `tab_switch` count above which app-switching advice is given
const TAB_SWITCH_LIMIT: u32 = 3;

/// Session aggregator with a fixed violation threshold
#[derive(Debug, Clone, Copy)]
pub struct SessionAggregator {
    violation_threshold: u32,
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self {
            violation_threshold: DEFAULT_VIOLATION_THRESHOLD,
        }
    }
}

impl SessionAggregator {
    /// A zero threshold is rejected since it would rate every session high
    pub fn new(violation_threshold: u32) -> Result<Self, ProctorError> {
        check_violation_threshold(violation_threshold)?;
        Ok(Self {
            violation_threshold,
        })
    }

    pub fn violation_threshold(&self) -> u32 {
        self.violation_threshold
    }

    /// Build the risk report for a session's events
    pub fn analyze(&self, events: &[ViolationEvent]) -> SessionReport {
        let violation_breakdown = Self::breakdown(events);
        let total_violations = violation_breakdown.values().sum();

        SessionReport {
            total_violations,
            suspicious_level: self.suspicion_level(total_violations),
            recommendations: Self::recommendations(&violation_breakdown),
            violation_breakdown,
        }
    }

    /// Count events per violation type
    pub fn breakdown(events: &[ViolationEvent]) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for event in events {
            *counts
                .entry(event.violation_type().as_str().to_string())
                .or_insert(0) += 1;
        }
        counts
    }

    /// `high` from twice the threshold, `medium` from the threshold, otherwise `low`
    pub fn suspicion_level(&self, total_violations: u32) -> SuspicionLevel {
        if total_violations >= self.violation_threshold.saturating_mul(2) {
            SuspicionLevel::High
        } else if total_violations >= self.violation_threshold {
            SuspicionLevel::Medium
        } else {
            SuspicionLevel::Low
        }
    }

    /// Advice for the candidate, one entry per matching rule in fixed order
    pub fn recommendations(breakdown: &BTreeMap<String, u32>) -> Vec<String> {
        let count = |kind: ViolationType| breakdown.get(kind.as_str()).copied().unwrap_or(0);

        let rules = [
            (
                count(ViolationType::FaceNotDetected) > FACE_NOT_DETECTED_LIMIT,
                RECOMMEND_LIGHTING,
            ),
            (
                count(ViolationType::MultipleFaces) > MULTIPLE_FACES_LIMIT,
                RECOMMEND_SINGLE_OCCUPANT,
            ),
            (
                count(ViolationType::TabSwitch) > TAB_SWITCH_LIMIT,
                RECOMMEND_FEWER_APP_SWITCHES,
            ),
        ];

        rules
            .into_iter()
            .filter(|(fires, _)| *fires)
            .map(|(_, advice)| advice.to_string())
            .collect()
    }
}
