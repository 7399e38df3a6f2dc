//! Core types for the Synheart Proctor pipeline
//!
//! This module defines the values that flow between the detectors and the
//! session aggregator: face boxes, window focus state, violation events and
//! the session-level risk report.

use crate::error::ProctorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Face bounding box in frame-pixel space, in detector order (top, right, bottom, left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "BoundingBoxRepr")]
pub struct BoundingBox {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Wire forms accepted for a bounding box: the detector's native 4-tuple or a named object
#[derive(Deserialize)]
#[serde(untagged)]
enum BoundingBoxRepr {
    Tuple([f64; 4]),
    Named {
        top: f64,
        right: f64,
        bottom: f64,
        left: f64,
    },
}

impl From<BoundingBoxRepr> for BoundingBox {
    fn from(repr: BoundingBoxRepr) -> Self {
        match repr {
            BoundingBoxRepr::Tuple([top, right, bottom, left]) => {
                BoundingBox::new(top, right, bottom, left)
            }
            BoundingBoxRepr::Named {
                top,
                right,
                bottom,
                left,
            } => BoundingBox::new(top, right, bottom, left),
        }
    }
}

impl BoundingBox {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Box center as ((top + bottom) / 2, (right + left) / 2)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.top + self.bottom) / 2.0,
            (self.right + self.left) / 2.0,
        )
    }

    /// Reject boxes with non-finite coordinates
    pub fn validate(&self) -> Result<(), ProctorError> {
        let coords = [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ];
        for (name, value) in coords {
            if !value.is_finite() {
                return Err(ProctorError::InvalidInput(format!(
                    "bounding box {name} coordinate is not finite: {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Integrity violation classification
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    FaceNotDetected,
    MultipleFaces,
    SuspiciousMovement,
    TabSwitch,
    /// Violation kinds produced by components outside this crate
    #[serde(untagged)]
    Other(String),
}

impl ViolationType {
    pub fn as_str(&self) -> &str {
        match self {
            ViolationType::FaceNotDetected => "face_not_detected",
            ViolationType::MultipleFaces => "multiple_faces",
            ViolationType::SuspiciousMovement => "suspicious_movement",
            ViolationType::TabSwitch => "tab_switch",
            ViolationType::Other(name) => name.as_str(),
        }
    }

    /// Severity that always accompanies a built-in type
    pub fn fixed_severity(&self) -> Option<Severity> {
        match self {
            ViolationType::FaceNotDetected | ViolationType::MultipleFaces => Some(Severity::High),
            ViolationType::SuspiciousMovement | ViolationType::TabSwitch => Some(Severity::Medium),
            ViolationType::Other(_) => None,
        }
    }

    fn is_builtin_name(name: &str) -> bool {
        matches!(
            name,
            "face_not_detected" | "multiple_faces" | "suspicious_movement" | "tab_switch"
        )
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violation severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One detected integrity concern at a point in time.
///
/// Type and severity are fixed together by the constructors and the fields
/// are only readable afterwards. Deserialization enforces the same pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ViolationEventRepr")]
pub struct ViolationEvent {
    #[serde(rename = "type")]
    violation_type: ViolationType,
    severity: Severity,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<BTreeMap<String, serde_json::Value>>,
}

impl ViolationEvent {
    /// No face in the frame
    pub fn face_not_detected(timestamp: DateTime<Utc>) -> Self {
        Self {
            violation_type: ViolationType::FaceNotDetected,
            severity: Severity::High,
            timestamp,
            details: None,
        }
    }

    /// More than one face in the frame
    pub fn multiple_faces(timestamp: DateTime<Utc>) -> Self {
        Self {
            violation_type: ViolationType::MultipleFaces,
            severity: Severity::High,
            timestamp,
            details: None,
        }
    }

    /// Face center moved further than the configured threshold between frames
    pub fn suspicious_movement(timestamp: DateTime<Utc>, movement_distance: f64) -> Self {
        let mut details = BTreeMap::new();
        details.insert(
            "movement_distance".to_string(),
            serde_json::json!(movement_distance),
        );
        Self {
            violation_type: ViolationType::SuspiciousMovement,
            severity: Severity::Medium,
            timestamp,
            details: Some(details),
        }
    }

    /// Assessment window lost focus
    pub fn tab_switch(timestamp: DateTime<Utc>, window_title: &str, duration_sec: f64) -> Self {
        let mut details = BTreeMap::new();
        details.insert("window_title".to_string(), serde_json::json!(window_title));
        details.insert("duration".to_string(), serde_json::json!(duration_sec));
        Self {
            violation_type: ViolationType::TabSwitch,
            severity: Severity::Medium,
            timestamp,
            details: Some(details),
        }
    }

    /// Event of a kind this crate does not classify itself.
    ///
    /// Built-in type names are rejected; use their constructors instead.
    pub fn custom(
        name: impl Into<String>,
        severity: Severity,
        timestamp: DateTime<Utc>,
        details: Option<BTreeMap<String, serde_json::Value>>,
    ) -> Result<Self, ProctorError> {
        let name = name.into();
        if ViolationType::is_builtin_name(&name) {
            return Err(ProctorError::InvalidInput(format!(
                "'{name}' is a built-in violation type"
            )));
        }
        Ok(Self {
            violation_type: ViolationType::Other(name),
            severity,
            timestamp,
            details,
        })
    }

    pub fn violation_type(&self) -> &ViolationType {
        &self.violation_type
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn details(&self) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.details.as_ref()
    }

    /// Look up a single detail value
    pub fn detail(&self, key: &str) -> Option<&serde_json::Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }
}

#[derive(Deserialize)]
struct ViolationEventRepr {
    #[serde(rename = "type")]
    violation_type: ViolationType,
    severity: Severity,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    details: Option<BTreeMap<String, serde_json::Value>>,
}

impl TryFrom<ViolationEventRepr> for ViolationEvent {
    type Error = ProctorError;

    fn try_from(repr: ViolationEventRepr) -> Result<Self, Self::Error> {
        match (&repr.violation_type, repr.violation_type.fixed_severity()) {
            (ViolationType::Other(name), _) if ViolationType::is_builtin_name(name) => {
                return Err(ProctorError::InvalidInput(format!(
                    "'{name}' is a built-in violation type"
                )));
            }
            (violation_type, Some(expected)) if expected != repr.severity => {
                return Err(ProctorError::InvalidInput(format!(
                    "{violation_type} violations are {expected:?} severity, got {:?}",
                    repr.severity
                )));
            }
            _ => {}
        }
        Ok(Self {
            violation_type: repr.violation_type,
            severity: repr.severity,
            timestamp: repr.timestamp,
            details: repr.details,
        })
    }
}

/// Window focus state delivered by the focus source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    pub is_focused: bool,
    pub title: String,
    /// How long the window has been unfocused (seconds)
    #[serde(alias = "unfocused_duration")]
    pub unfocused_duration_sec: f64,
}

impl WindowState {
    pub fn focused(title: impl Into<String>) -> Self {
        Self {
            is_focused: true,
            title: title.into(),
            unfocused_duration_sec: 0.0,
        }
    }

    pub fn unfocused(title: impl Into<String>, unfocused_duration_sec: f64) -> Self {
        Self {
            is_focused: false,
            title: title.into(),
            unfocused_duration_sec,
        }
    }

    pub fn validate(&self) -> Result<(), ProctorError> {
        if !self.unfocused_duration_sec.is_finite() || self.unfocused_duration_sec < 0.0 {
            return Err(ProctorError::InvalidInput(format!(
                "unfocused duration must be a non-negative number of seconds, got {}",
                self.unfocused_duration_sec
            )));
        }
        Ok(())
    }
}

/// Coarse three-tier session risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspicionLevel {
    Low,
    Medium,
    High,
}

/// Session-level risk report derived from a list of violation events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub total_violations: u32,
    /// Count per violation type, keyed by the type's wire name
    pub violation_breakdown: BTreeMap<String, u32>,
    pub suspicious_level: SuspicionLevel,
    pub recommendations: Vec<String>,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Where a report came from and when it was computed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub session_id: String,
    pub input_schema: String,
    /// Earliest violation timestamp, absent for a clean session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_event_utc: Option<String>,
    /// Latest violation timestamp, absent for a clean session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_event_utc: Option<String>,
    pub computed_at_utc: String,
}

/// Complete report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPayload {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub report: SessionReport,
}
