//! Proctoring pipeline orchestration
//!
//! JSON-facing API over the session core: observation records in,
//! violation events and report payloads out.

use crate::config::ProctorConfig;
use crate::detector::TrackerState;
use crate::encoder::ReportEncoder;
use crate::error::ProctorError;
use crate::schema::ObservationAdapter;
use crate::session::SessionMonitor;
use crate::types::SessionReport;

/// Replay a whole session's observations and return the report payload JSON (stateless, one-shot).
///
/// # Arguments
/// * `session_id` - Identifier recorded in the report provenance
/// * `observations_json` - JSON array or NDJSON of proctor.observation.v1 records
///
/// # Example
/// ```ignore
/// let report_json = observations_to_report("sess-1", observations_json)?;
/// ```
pub fn observations_to_report(
    session_id: &str,
    observations_json: String,
) -> Result<String, ProctorError> {
    observations_to_report_with_config(session_id, observations_json, &ProctorConfig::default())
}

/// Like [`observations_to_report`], with explicit thresholds
pub fn observations_to_report_with_config(
    session_id: &str,
    observations_json: String,
    config: &ProctorConfig,
) -> Result<String, ProctorError> {
    // Stage 1: Parse observations
    let observations = ObservationAdapter::parse(&observations_json)?;

    // Stage 2: Replay through a fresh session
    let mut monitor = SessionMonitor::new(session_id, config)?;
    ObservationAdapter::replay(&mut monitor, &observations)?;

    // Stage 3: Encode the report
    ReportEncoder::new().encode_to_json(&monitor)
}

/// Stateful processor for incremental ingestion of one session's observations.
///
/// Feed NDJSON chunks as they arrive; take a report whenever needed.
pub struct ProctorProcessor {
    monitor: SessionMonitor,
    encoder: ReportEncoder,
}

impl ProctorProcessor {
    /// Create a processor with default thresholds
    pub fn new(session_id: &str) -> Result<Self, ProctorError> {
        Self::with_config(session_id, ProctorConfig::default())
    }

    /// Create a processor with specific thresholds
    pub fn with_config(session_id: &str, config: ProctorConfig) -> Result<Self, ProctorError> {
        Ok(Self {
            monitor: SessionMonitor::new(session_id, &config)?,
            encoder: ReportEncoder::new(),
        })
    }

    /// Process a chunk of observations and return the new violations as a JSON array
    pub fn process(&mut self, observations_json: &str) -> Result<String, ProctorError> {
        let observations = ObservationAdapter::parse(observations_json)?;
        let violations = ObservationAdapter::replay(&mut self.monitor, &observations)?;
        serde_json::to_string(&violations).map_err(ProctorError::JsonError)
    }

    /// Current report
    pub fn report(&self) -> SessionReport {
        self.monitor.report()
    }

    /// Current report payload as JSON
    pub fn report_json(&self) -> Result<String, ProctorError> {
        self.encoder.encode_to_json(&self.monitor)
    }

    /// Save tracker state to JSON for persistence
    pub fn save_state(&self) -> Result<String, ProctorError> {
        self.monitor
            .tracker_state()
            .to_json()
            .map_err(|e| ProctorError::EncodingError(e.to_string()))
    }

    /// Load tracker state from JSON
    pub fn load_state(&mut self, json: &str) -> Result<(), ProctorError> {
        let state = TrackerState::from_json(json)?;
        self.monitor.restore_tracker(state)
    }

    /// Number of violations recorded so far
    pub fn event_count(&self) -> usize {
        self.monitor.event_count()
    }

    /// Drop recorded violations and the movement baseline
    pub fn clear(&mut self) {
        self.monitor.clear();
    }

    pub fn monitor(&self) -> &SessionMonitor {
        &self.monitor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{RECOMMEND_LIGHTING, RECOMMEND_SINGLE_OCCUPANT};
    use crate::types::SuspicionLevel;

    fn sample_session_ndjson() -> &'static str {
        r#"{"kind":"frame","timestamp":"2024-03-04T14:00:00Z","faces":[[100,180,180,100]]}
{"kind":"frame","timestamp":"2024-03-04T14:00:01Z","faces":[[102,182,182,102]]}
{"kind":"frame","timestamp":"2024-03-04T14:00:02Z","faces":[]}
{"kind":"frame","timestamp":"2024-03-04T14:00:03Z","faces":[]}
{"kind":"frame","timestamp":"2024-03-04T14:00:04Z","faces":[]}
{"kind":"frame","timestamp":"2024-03-04T14:00:05Z","faces":[[100,180,180,100],[100,480,180,400]]}
{"kind":"focus","timestamp":"2024-03-04T14:00:06Z","is_focused":true,"title":"Assessment","unfocused_duration_sec":0.0}
{"kind":"frame","timestamp":"2024-03-04T14:00:07Z","faces":[[100,180,180,100]]}"#
    }

    #[test]
    fn test_observations_to_report_stateless() {
        let json = observations_to_report("sess-abc", sample_session_ndjson().to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["report_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "synheart-proctor");
        assert_eq!(payload["provenance"]["session_id"], "sess-abc");

        let report = &payload["report"];
        assert_eq!(report["total_violations"], 4);
        assert_eq!(report["violation_breakdown"]["face_not_detected"], 3);
        assert_eq!(report["violation_breakdown"]["multiple_faces"], 1);
        assert_eq!(report["suspicious_level"], "medium");
        assert_eq!(report["recommendations"][0], RECOMMEND_LIGHTING);
        assert_eq!(report["recommendations"][1], RECOMMEND_SINGLE_OCCUPANT);
    }

    #[test]
    fn test_processor_incremental() {
        let mut processor = ProctorProcessor::new("sess-inc").unwrap();
        let lines: Vec<&str> = sample_session_ndjson().lines().collect();

        let first = processor.process(&lines[..3].join("\n")).unwrap();
        let first: Vec<serde_json::Value> = serde_json::from_str(&first).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["type"], "face_not_detected");
        assert_eq!(processor.report().suspicious_level, SuspicionLevel::Low);

        processor.process(&lines[3..].join("\n")).unwrap();
        assert_eq!(processor.event_count(), 4);
        assert_eq!(processor.report().suspicious_level, SuspicionLevel::Medium);
    }

    #[test]
    fn test_state_persistence_keeps_baseline() {
        let mut processor = ProctorProcessor::new("sess-a").unwrap();
        processor
            .process(r#"{"kind":"frame","timestamp":"2024-03-04T14:00:00Z","faces":[[100,180,180,100]]}"#)
            .unwrap();
        let saved = processor.save_state().unwrap();

        let mut resumed = ProctorProcessor::new("sess-a").unwrap();
        resumed.load_state(&saved).unwrap();
        let out = resumed
            .process(r#"{"kind":"frame","timestamp":"2024-03-04T14:00:01Z","faces":[[100,480,180,400]]}"#)
            .unwrap();

        let events: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["type"], "suspicious_movement");
        assert_eq!(events[0]["details"]["movement_distance"], 300.0);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = ProctorConfig::default()
            .with_movement_threshold(1.0)
            .with_violation_threshold(1);
        let mut processor = ProctorProcessor::with_config("sess-strict", config).unwrap();
        processor.process(sample_session_ndjson()).unwrap();

        // Both ~2.8px steps between single-face frames now count as movement
        assert_eq!(
            processor.report().violation_breakdown.get("suspicious_movement"),
            Some(&2)
        );
        assert_eq!(processor.report().suspicious_level, SuspicionLevel::High);
    }

    #[test]
    fn test_one_shot_with_config() {
        let config = ProctorConfig::default()
            .with_movement_threshold(1.0)
            .with_violation_threshold(1);
        let json = observations_to_report_with_config(
            "sess-cfg",
            sample_session_ndjson().to_string(),
            &config,
        )
        .unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["report"]["violation_breakdown"]["suspicious_movement"], 2);
        assert_eq!(payload["report"]["suspicious_level"], "high");

        let invalid = ProctorConfig::default().with_violation_threshold(0);
        assert!(matches!(
            observations_to_report_with_config("sess-cfg", String::new(), &invalid),
            Err(ProctorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_focus_record_without_window_fields_rejected() {
        let mut processor = ProctorProcessor::new("sess-focus").unwrap();
        let result = processor
            .process(r#"{"kind":"focus","timestamp":"2024-03-04T14:00:00Z","is_focused":false}"#);

        assert!(result.is_err());
        assert_eq!(processor.event_count(), 0);
    }

    #[test]
    fn test_violation_record_severity_must_match_type() {
        let mut processor = ProctorProcessor::new("sess-sev").unwrap();
        let result = processor.process(
            r#"{"kind":"violation","event":{"type":"face_not_detected","severity":"low","timestamp":"2024-03-04T14:00:00Z"}}"#,
        );

        assert!(result.is_err());
        assert_eq!(processor.event_count(), 0);
    }

    #[test]
    fn test_load_state_rejects_negative_threshold() {
        let mut processor = ProctorProcessor::new("sess-state").unwrap();
        let result = processor
            .load_state(r#"{"previous_face_location":[100,180,180,100],"movement_threshold":-1.0}"#);
        assert!(matches!(result, Err(ProctorError::InvalidConfig(_))));

        // Identical box with the default state produces nothing
        let out = processor
            .process(r#"{"kind":"frame","timestamp":"2024-03-04T14:00:00Z","faces":[[100,180,180,100]]}"#)
            .unwrap();
        processor
            .process(r#"{"kind":"frame","timestamp":"2024-03-04T14:00:01Z","faces":[[100,180,180,100]]}"#)
            .unwrap();
        assert_eq!(out, "[]");
        assert_eq!(processor.event_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut processor = ProctorProcessor::new("sess-clear").unwrap();
        processor.process(sample_session_ndjson()).unwrap();
        processor.clear();

        assert_eq!(processor.event_count(), 0);
        assert_eq!(processor.report().total_violations, 0);
    }

    #[test]
    fn test_empty_input_gives_clean_report() {
        let json = observations_to_report("empty", String::new()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["report"]["total_violations"], 0);
        assert_eq!(payload["report"]["suspicious_level"], "low");
    }

    #[test]
    fn test_invalid_json() {
        assert!(observations_to_report("bad", "not valid json".to_string()).is_err());
        assert!(ProctorProcessor::new("bad").unwrap().load_state("{").is_err());
    }
}
