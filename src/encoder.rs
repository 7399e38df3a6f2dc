//! Report encoding
//!
//! Wraps a session's risk report with producer and provenance metadata.

use crate::error::ProctorError;
use crate::schema::SCHEMA_VERSION;
use crate::session::SessionMonitor;
use crate::types::{ReportPayload, ReportProducer, ReportProvenance};
use crate::{PRODUCER_NAME, PROCTOR_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder for session report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode the current state of a session into a report payload
    pub fn encode(&self, monitor: &SessionMonitor) -> Result<ReportPayload, ProctorError> {
        let computed_at = Utc::now();
        let events = monitor.events();

        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: PROCTOR_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            session_id: monitor.session_id().to_string(),
            input_schema: SCHEMA_VERSION.to_string(),
            first_event_utc: events.iter().map(|e| e.timestamp()).min().map(|t| t.to_rfc3339()),
            last_event_utc: events.iter().map(|e| e.timestamp()).max().map(|t| t.to_rfc3339()),
            computed_at_utc: computed_at.to_rfc3339(),
        };

        Ok(ReportPayload {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            report: monitor.report(),
        })
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, monitor: &SessionMonitor) -> Result<String, ProctorError> {
        let payload = self.encode(monitor)?;
        serde_json::to_string_pretty(&payload).map_err(ProctorError::JsonError)
    }
}
