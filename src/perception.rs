//! Seams to the external perception and evidence components
//!
//! Face detection and screenshot storage live outside this crate. Sessions
//! receive a [`FacePerception`] at construction; evidence capture goes
//! through a caller-supplied [`ScreenshotSink`].

use crate::error::ProctorError;
use crate::types::{BoundingBox, ViolationType};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::VecDeque;

/// Face detector: turns a decoded frame into zero or more face boxes.
///
/// Box order is unspecified when several faces are present.
pub trait FacePerception {
    type Frame;

    fn detect_faces(&self, frame: &Self::Frame) -> Result<Vec<BoundingBox>, ProctorError>;
}

/// Evidence store for frames that produced a violation
pub trait ScreenshotSink<F> {
    /// Persist `frame` and return an identifier for it
    fn capture(&mut self, frame: &F, violation_type: &ViolationType) -> Result<String, ProctorError>;
}

/// Conventional screenshot name, `violation_<type>_<YYYYmmdd_HHMMSS>.jpg`
pub fn screenshot_name(violation_type: &ViolationType, at: DateTime<Utc>) -> String {
    format!(
        "violation_{}_{}.jpg",
        violation_type.as_str(),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Deterministic perception that replays scripted detections, one per frame.
///
/// Once the script is exhausted every frame reports no faces.
#[derive(Debug, Default)]
pub struct StaticPerception {
    script: RefCell<VecDeque<Vec<BoundingBox>>>,
}

impl StaticPerception {
    pub fn new(script: impl IntoIterator<Item = Vec<BoundingBox>>) -> Self {
        Self {
            script: RefCell::new(script.into_iter().collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.borrow().len()
    }
}

impl FacePerception for StaticPerception {
    type Frame = ();

    fn detect_faces(&self, _frame: &()) -> Result<Vec<BoundingBox>, ProctorError> {
        Ok(self.script.borrow_mut().pop_front().unwrap_or_default())
    }
}
