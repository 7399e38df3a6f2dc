//! Adapter for feeding proctor.observation.v1 records into a session
//!
//! Parses observation batches and replays them, in timestamp order, through
//! a [`SessionMonitor`].

use crate::error::ProctorError;
use crate::schema::observation::Observation;
use crate::session::SessionMonitor;
use crate::types::{ViolationEvent, WindowState};

/// Adapter for converting observations to violation events
pub struct ObservationAdapter;

impl ObservationAdapter {
    /// Parse a JSON string containing an array of observations
    pub fn parse_array(json: &str) -> Result<Vec<Observation>, ProctorError> {
        let observations: Vec<Observation> = serde_json::from_str(json)?;
        Ok(observations)
    }

    /// Parse NDJSON (newline-delimited JSON) containing observations
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<Observation>, ProctorError> {
        let mut observations = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Observation>(trimmed) {
                Ok(observation) => observations.push(observation),
                Err(e) => {
                    return Err(ProctorError::ParseError(format!(
                        "line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(observations)
    }

    /// Parse either a JSON array or NDJSON, based on the first non-blank character
    pub fn parse(input: &str) -> Result<Vec<Observation>, ProctorError> {
        if input.trim_start().starts_with('[') {
            Self::parse_array(input)
        } else {
            Self::parse_ndjson(input)
        }
    }

    /// Apply one observation to a session
    pub fn apply(
        monitor: &mut SessionMonitor,
        observation: &Observation,
    ) -> Result<Vec<ViolationEvent>, ProctorError> {
        match observation {
            Observation::Frame { timestamp, faces } => monitor.observe_faces_at(faces, *timestamp),
            Observation::Focus {
                timestamp,
                is_focused,
                title,
                unfocused_duration_sec,
            } => {
                let window = WindowState {
                    is_focused: *is_focused,
                    title: title.clone(),
                    unfocused_duration_sec: *unfocused_duration_sec,
                };
                Ok(monitor
                    .observe_window_at(&window, *timestamp)?
                    .into_iter()
                    .collect())
            }
            Observation::Violation { event } => {
                monitor.record(event.clone());
                Ok(vec![event.clone()])
            }
        }
    }

    /// Replay a batch through a session in timestamp order.
    ///
    /// The batch is validated up front; a single invalid record rejects the
    /// whole batch before any state changes.
    pub fn replay(
        monitor: &mut SessionMonitor,
        observations: &[Observation],
    ) -> Result<Vec<ViolationEvent>, ProctorError> {
        if let Some(invalid) = Self::validate_observations(observations).into_iter().next() {
            log::warn!(
                "session {}: rejecting batch, observation {} ({}) invalid: {}",
                monitor.session_id(),
                invalid.index,
                invalid.kind,
                invalid.error
            );
            return Err(ProctorError::InvalidInput(format!(
                "observation {}: {}",
                invalid.index, invalid.error
            )));
        }

        // Stable sort keeps arrival order for equal timestamps
        let mut ordered: Vec<&Observation> = observations.iter().collect();
        ordered.sort_by_key(|o| o.timestamp());

        let mut violations = Vec::new();
        for observation in ordered {
            violations.extend(Self::apply(monitor, observation)?);
        }
        Ok(violations)
    }

    /// Validate a batch of observations
    pub fn validate_observations(observations: &[Observation]) -> Vec<ValidationResult> {
        observations
            .iter()
            .enumerate()
            .filter_map(|(idx, observation)| {
                observation.validate().err().map(|e| ValidationResult {
                    index: idx,
                    kind: observation.kind(),
                    error: e.to_string(),
                })
            })
            .collect()
    }
}

/// A failed observation validation
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub kind: &'static str,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProctorConfig;
    use crate::types::BoundingBox;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 13, 0, sec).unwrap()
    }

    fn face(x: f64) -> BoundingBox {
        BoundingBox::new(100.0, x + 80.0, 180.0, x)
    }

    fn monitor() -> SessionMonitor {
        SessionMonitor::new("replay", &ProctorConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = r#"{"kind":"frame","timestamp":"2024-03-04T13:00:00Z","faces":[]}

{"kind":"focus","timestamp":"2024-03-04T13:00:01Z","is_focused":true,"title":"Exam","unfocused_duration_sec":0.0}"#;

        let observations = ObservationAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(observations.len(), 2);
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let ndjson = r#"{"kind":"frame","timestamp":"2024-03-04T13:00:00Z","faces":[]}
{"kind":"frame","timestamp":"2024-03-04T13:00:01Z","faces":[[1,2,"x",4]]}"#;

        match ObservationAdapter::parse_ndjson(ndjson) {
            Err(ProctorError::ParseError(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_detects_array() {
        let json = r#"[{"kind":"frame","timestamp":"2024-03-04T13:00:00Z","faces":[]}]"#;
        assert_eq!(ObservationAdapter::parse(json).unwrap().len(), 1);
    }

    #[test]
    fn test_replay_sorts_by_timestamp() {
        // Arrives out of order; movement must be measured 0 -> 200 -> 210
        let observations = vec![
            Observation::frame(ts(2), vec![face(210.0)]),
            Observation::frame(ts(0), vec![face(0.0)]),
            Observation::frame(ts(1), vec![face(200.0)]),
        ];

        let mut monitor = monitor();
        let violations = ObservationAdapter::replay(&mut monitor, &observations).unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].timestamp(), ts(1));
        assert_eq!(
            monitor.tracker_state().previous_face_location(),
            Some(&face(210.0))
        );
    }

    #[test]
    fn test_replay_mixed_kinds() {
        let observations = vec![
            Observation::frame(ts(0), vec![]),
            Observation::focus(ts(1), WindowState::unfocused("Chat", 2.0)),
            Observation::focus(ts(2), WindowState::focused("Exam")),
            Observation::Violation {
                event: ViolationEvent::multiple_faces(ts(3)),
            },
        ];

        let mut monitor = monitor();
        let violations = ObservationAdapter::replay(&mut monitor, &observations).unwrap();

        assert_eq!(violations.len(), 3);
        assert_eq!(monitor.event_count(), 3);
    }

    #[test]
    fn test_invalid_batch_changes_nothing() {
        let observations = vec![
            Observation::frame(ts(0), vec![face(0.0)]),
            Observation::focus(ts(1), WindowState::unfocused("Chat", f64::NAN)),
        ];

        let results = ObservationAdapter::validate_observations(&observations);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, 1);
        assert_eq!(results[0].kind, "focus");

        let mut monitor = monitor();
        assert!(matches!(
            ObservationAdapter::replay(&mut monitor, &observations),
            Err(ProctorError::InvalidInput(_))
        ));
        assert_eq!(monitor.event_count(), 0);
        assert!(monitor.tracker_state().previous_face_location().is_none());
    }
}
