//! proctor.observation.v1 schema definition
//!
//! One record per perception output, tagged by `kind`:
//! - `frame`: face boxes detected in a video frame
//! - `focus`: a window focus poll or focus-change notification
//! - `violation`: an event already classified by another component

use crate::error::ProctorError;
use crate::types::{BoundingBox, ViolationEvent, WindowState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "proctor.observation.v1";

/// A single timestamped observation from a perception component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Frame {
        timestamp: DateTime<Utc>,
        faces: Vec<BoundingBox>,
    },
    Focus {
        timestamp: DateTime<Utc>,
        is_focused: bool,
        title: String,
        #[serde(alias = "unfocused_duration")]
        unfocused_duration_sec: f64,
    },
    Violation {
        event: ViolationEvent,
    },
}

impl Observation {
    /// Frame observation
    pub fn frame(timestamp: DateTime<Utc>, faces: Vec<BoundingBox>) -> Self {
        Observation::Frame { timestamp, faces }
    }

    /// Focus observation
    pub fn focus(timestamp: DateTime<Utc>, window: WindowState) -> Self {
        Observation::Focus {
            timestamp,
            is_focused: window.is_focused,
            title: window.title,
            unfocused_duration_sec: window.unfocused_duration_sec,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Observation::Frame { timestamp, .. } | Observation::Focus { timestamp, .. } => {
                *timestamp
            }
            Observation::Violation { event } => event.timestamp(),
        }
    }

    /// Window state carried by a focus observation
    pub fn window_state(&self) -> Option<WindowState> {
        match self {
            Observation::Focus {
                is_focused,
                title,
                unfocused_duration_sec,
                ..
            } => Some(WindowState {
                is_focused: *is_focused,
                title: title.clone(),
                unfocused_duration_sec: *unfocused_duration_sec,
            }),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Observation::Frame { .. } => "frame",
            Observation::Focus { .. } => "focus",
            Observation::Violation { .. } => "violation",
        }
    }

    /// Check the values serde cannot: finite coordinates and durations
    pub fn validate(&self) -> Result<(), ProctorError> {
        match self {
            Observation::Frame { faces, .. } => {
                for face in faces {
                    face.validate()?;
                }
                Ok(())
            }
            Observation::Focus { .. } => match self.window_state() {
                Some(window) => window.validate(),
                None => Ok(()),
            },
            Observation::Violation { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_frame_record() {
        let json = r#"{"kind": "frame", "timestamp": "2024-03-04T09:00:00Z", "faces": [[10, 110, 90, 30]]}"#;
        let observation: Observation = serde_json::from_str(json).unwrap();

        assert_eq!(observation.kind(), "frame");
        assert_eq!(
            observation,
            Observation::frame(
                Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
                vec![BoundingBox::new(10.0, 110.0, 90.0, 30.0)]
            )
        );
    }

    #[test]
    fn test_parse_focus_record() {
        let json = r#"{"kind": "focus", "timestamp": "2024-03-04T09:00:05Z", "is_focused": false, "title": "Chat", "unfocused_duration": 3.5}"#;
        let observation: Observation = serde_json::from_str(json).unwrap();

        let window = observation.window_state().unwrap();
        assert!(!window.is_focused);
        assert_eq!(window.title, "Chat");
        assert_eq!(window.unfocused_duration_sec, 3.5);
    }

    #[test]
    fn test_parse_violation_record() {
        let json = r#"{"kind": "violation", "event": {"type": "audio_anomaly", "severity": "low", "timestamp": "2024-03-04T09:00:07Z"}}"#;
        let observation: Observation = serde_json::from_str(json).unwrap();

        assert_eq!(
            observation.timestamp(),
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 7).unwrap()
        );
        assert!(observation.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert!(serde_json::from_str::<Observation>(r#"{"kind": "frame", "timestamp": "2024-03-04T09:00:00Z"}"#).is_err());
        assert!(serde_json::from_str::<Observation>(r#"{"kind": "frame", "timestamp": "2024-03-04T09:00:00Z", "faces": [["a", 1, 2, 3]]}"#).is_err());
        assert!(serde_json::from_str::<Observation>(r#"{"kind": "audio", "timestamp": "2024-03-04T09:00:00Z"}"#).is_err());
    }

    #[test]
    fn test_focus_record_requires_window_fields() {
        let json = r#"{"kind": "focus", "timestamp": "2024-03-04T09:00:00Z", "is_focused": false}"#;
        assert!(serde_json::from_str::<Observation>(json).is_err());

        let json = r#"{"kind": "focus", "timestamp": "2024-03-04T09:00:00Z", "is_focused": false, "title": "Chat"}"#;
        assert!(serde_json::from_str::<Observation>(json).is_err());
    }

    #[test]
    fn test_violation_record_with_mismatched_severity_rejected() {
        let json = r#"{"kind": "violation", "event": {"type": "face_not_detected", "severity": "low", "timestamp": "2024-03-04T09:00:07Z"}}"#;
        assert!(serde_json::from_str::<Observation>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_duration() {
        let observation = Observation::focus(
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            WindowState::unfocused("Chat", -5.0),
        );
        assert!(matches!(
            observation.validate(),
            Err(ProctorError::InvalidInput(_))
        ));
    }
}
