//! Per-session monitoring handles
//!
//! A [`SessionMonitor`] owns everything one candidate session needs: its
//! own tracker state, the focus checker, the aggregator and the events
//! accumulated so far. Nothing is shared between sessions, so one monitor
//! can be driven from one thread of control without locking.

use crate::aggregator::SessionAggregator;
use crate::config::ProctorConfig;
use crate::detector::{FrameViolationDetector, TrackerState};
use crate::error::ProctorError;
use crate::focus::FocusMonitor;
use crate::perception::{FacePerception, ScreenshotSink};
use crate::types::{BoundingBox, SessionReport, ViolationEvent, WindowState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Detector, focus checker and event log for one session
#[derive(Debug, Clone)]
pub struct SessionMonitor {
    session_id: String,
    detector: FrameViolationDetector,
    focus: FocusMonitor,
    aggregator: SessionAggregator,
    events: Vec<ViolationEvent>,
}

impl SessionMonitor {
    pub fn new(session_id: impl Into<String>, config: &ProctorConfig) -> Result<Self, ProctorError> {
        config.validate()?;
        Ok(Self {
            session_id: session_id.into(),
            detector: FrameViolationDetector::new(config.movement_threshold),
            focus: FocusMonitor::new(),
            aggregator: SessionAggregator::new(config.violation_threshold)?,
            events: Vec::new(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Classify a frame's face boxes observed now
    pub fn observe_faces(
        &mut self,
        face_boxes: &[BoundingBox],
    ) -> Result<Vec<ViolationEvent>, ProctorError> {
        self.observe_faces_at(face_boxes, Utc::now())
    }

    /// Classify a frame's face boxes observed at `timestamp` and record the violations
    pub fn observe_faces_at(
        &mut self,
        face_boxes: &[BoundingBox],
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<ViolationEvent>, ProctorError> {
        let violations = self.detector.process_frame_at(face_boxes, timestamp)?;
        self.events.extend(violations.iter().cloned());
        Ok(violations)
    }

    /// Check a window state observed now
    pub fn observe_window(
        &mut self,
        window: &WindowState,
    ) -> Result<Option<ViolationEvent>, ProctorError> {
        self.observe_window_at(window, Utc::now())
    }

    /// Check a window state observed at `timestamp` and record any violation
    pub fn observe_window_at(
        &mut self,
        window: &WindowState,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<ViolationEvent>, ProctorError> {
        let violation = self.focus.check_focus_at(window, timestamp)?;
        if let Some(event) = &violation {
            self.events.push(event.clone());
        }
        Ok(violation)
    }

    /// Record an event classified by another component
    pub fn record(&mut self, event: ViolationEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ViolationEvent] {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Risk report over the events recorded so far
    pub fn report(&self) -> SessionReport {
        self.aggregator.analyze(&self.events)
    }

    /// Final report; the tracker state is dropped with the monitor
    pub fn into_report(self) -> SessionReport {
        self.report()
    }

    pub fn tracker_state(&self) -> &TrackerState {
        self.detector.state()
    }

    /// Replace the tracker state, e.g. when resuming a persisted session
    pub fn restore_tracker(&mut self, state: TrackerState) -> Result<(), ProctorError> {
        state.validate()?;
        self.detector = FrameViolationDetector::with_state(state);
        Ok(())
    }

    /// Drop recorded events and the movement baseline
    pub fn clear(&mut self) {
        self.events.clear();
        self.detector.reset();
    }
}

/// A violation together with the evidence captured for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedViolation {
    #[serde(flatten)]
    pub event: ViolationEvent,
    /// Identifier returned by the screenshot sink
    #[serde(
        rename = "screenshot_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub screenshot_id: Option<String>,
}

/// A session monitor driven by an injected face detector
#[derive(Debug)]
pub struct ProctorSession<P: FacePerception> {
    perception: P,
    monitor: SessionMonitor,
}

impl<P: FacePerception> ProctorSession<P> {
    pub fn new(
        session_id: impl Into<String>,
        config: &ProctorConfig,
        perception: P,
    ) -> Result<Self, ProctorError> {
        Ok(Self {
            perception,
            monitor: SessionMonitor::new(session_id, config)?,
        })
    }

    /// Run face detection on a frame, then classify it
    pub fn process_frame(&mut self, frame: &P::Frame) -> Result<Vec<ViolationEvent>, ProctorError> {
        let faces = self.perception.detect_faces(frame)?;
        self.monitor.observe_faces(&faces)
    }

    /// Like [`process_frame`](Self::process_frame), capturing a screenshot per violation.
    ///
    /// A failed capture is logged and leaves `screenshot_id` empty; the
    /// violation itself is still recorded.
    pub fn process_frame_with_evidence<S>(
        &mut self,
        frame: &P::Frame,
        sink: &mut S,
    ) -> Result<Vec<RecordedViolation>, ProctorError>
    where
        S: ScreenshotSink<P::Frame>,
    {
        let violations = self.process_frame(frame)?;
        let recorded = violations
            .into_iter()
            .map(|event| {
                let screenshot_id = match sink.capture(frame, event.violation_type()) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        log::warn!(
                            "session {}: screenshot for {} failed: {e}",
                            self.monitor.session_id(),
                            event.violation_type()
                        );
                        None
                    }
                };
                RecordedViolation {
                    event,
                    screenshot_id,
                }
            })
            .collect();
        Ok(recorded)
    }

    pub fn check_focus(&mut self, window: &WindowState) -> Result<Option<ViolationEvent>, ProctorError> {
        self.monitor.observe_window(window)
    }

    pub fn report(&self) -> SessionReport {
        self.monitor.report()
    }

    pub fn monitor(&self) -> &SessionMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut SessionMonitor {
        &mut self.monitor
    }

    pub fn into_monitor(self) -> SessionMonitor {
        self.monitor
    }
}
