//! Frame violation detection
//!
//! Classifies one frame's face boxes into violation events and keeps the
//! last known single-face position for movement comparison.
//!
//! Rules, in order:
//! 1. no face: `face_not_detected`
//! 2. more than one face: `multiple_faces`
//! 3. exactly one face: `suspicious_movement` when the center moved more than
//!    the threshold since the previous single-face frame, then the position
//!    is recorded
//!
//! Frames without exactly one face leave the previous position untouched so a
//! brief dropout does not reset the movement baseline.

use crate::config::{check_movement_threshold, DEFAULT_MOVEMENT_THRESHOLD};
use crate::error::ProctorError;
use crate::movement::movement_distance;
use crate::types::{BoundingBox, ViolationEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-session movement tracking state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerState {
    /// Most recent position seen in a frame with exactly one face
    previous_face_location: Option<BoundingBox>,
    /// Center displacement above which movement is suspicious
    movement_threshold: f64,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new(DEFAULT_MOVEMENT_THRESHOLD)
    }
}

impl TrackerState {
    pub fn new(movement_threshold: f64) -> Self {
        Self {
            previous_face_location: None,
            movement_threshold,
        }
    }

    pub fn previous_face_location(&self) -> Option<&BoundingBox> {
        self.previous_face_location.as_ref()
    }

    pub fn movement_threshold(&self) -> f64 {
        self.movement_threshold
    }

    /// Threshold obeys the config rules and any stored box is finite
    pub fn validate(&self) -> Result<(), ProctorError> {
        check_movement_threshold(self.movement_threshold)?;
        if let Some(previous) = &self.previous_face_location {
            previous.validate()?;
        }
        Ok(())
    }

    /// Load and validate tracker state from JSON
    pub fn from_json(json: &str) -> Result<Self, ProctorError> {
        let state: TrackerState = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }

    /// Serialize tracker state to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Stateful detector for one session's frame stream
#[derive(Debug, Clone, Default)]
pub struct FrameViolationDetector {
    state: TrackerState,
}

impl FrameViolationDetector {
    pub fn new(movement_threshold: f64) -> Self {
        Self {
            state: TrackerState::new(movement_threshold),
        }
    }

    /// Resume from previously saved tracker state
    pub fn with_state(state: TrackerState) -> Self {
        Self { state }
    }

    /// Process a frame observed now
    pub fn process_frame(
        &mut self,
        face_boxes: &[BoundingBox],
    ) -> Result<Vec<ViolationEvent>, ProctorError> {
        self.process_frame_at(face_boxes, Utc::now())
    }

    /// Process a frame observed at `timestamp`.
    ///
    /// Frames must arrive in capture order. Any invalid box rejects the whole
    /// frame without touching the tracker state.
    pub fn process_frame_at(
        &mut self,
        face_boxes: &[BoundingBox],
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<ViolationEvent>, ProctorError> {
        for face in face_boxes {
            if let Err(e) = face.validate() {
                log::warn!("rejecting frame at {timestamp}: {e}");
                return Err(e);
            }
        }

        let mut violations = Vec::new();

        match face_boxes {
            [] => {
                log::debug!("no face detected at {timestamp}");
                violations.push(ViolationEvent::face_not_detected(timestamp));
            }
            [current] => {
                if let Some(previous) = &self.state.previous_face_location {
                    let movement = movement_distance(current, previous);
                    if movement > self.state.movement_threshold {
                        log::debug!(
                            "face moved {movement:.1}px (threshold {}) at {timestamp}",
                            self.state.movement_threshold
                        );
                        violations.push(ViolationEvent::suspicious_movement(timestamp, movement));
                    }
                }
                self.state.previous_face_location = Some(*current);
            }
            faces => {
                log::debug!("{} faces detected at {timestamp}", faces.len());
                violations.push(ViolationEvent::multiple_faces(timestamp));
            }
        }

        Ok(violations)
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Forget the previous face position, keeping the threshold
    pub fn reset(&mut self) {
        self.state.previous_face_location = None;
    }
}
