//! Window focus monitoring
//!
//! Every unfocused poll produces a `tab_switch` event. Callers that poll
//! on an interval decide themselves whether to suppress repeats.

use crate::error::ProctorError;
use crate::types::{ViolationEvent, WindowState};
use chrono::{DateTime, Utc};

/// Stateless focus checker
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusMonitor;

impl FocusMonitor {
    pub fn new() -> Self {
        Self
    }

    /// Check a window state observed now
    pub fn check_focus(&self, window: &WindowState) -> Result<Option<ViolationEvent>, ProctorError> {
        self.check_focus_at(window, Utc::now())
    }

    /// Check a window state observed at `timestamp`
    pub fn check_focus_at(
        &self,
        window: &WindowState,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<ViolationEvent>, ProctorError> {
        if let Err(e) = window.validate() {
            log::warn!("rejecting window state at {timestamp}: {e}");
            return Err(e);
        }

        if window.is_focused {
            return Ok(None);
        }

        log::debug!(
            "window '{}' unfocused for {:.1}s at {timestamp}",
            window.title,
            window.unfocused_duration_sec
        );
        Ok(Some(ViolationEvent::tab_switch(
            timestamp,
            &window.title,
            window.unfocused_duration_sec,
        )))
    }
}
