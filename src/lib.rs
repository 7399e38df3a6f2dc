//! Synheart Proctor - Integrity monitoring for online assessment sessions
//!
//! Proctor turns a stream of per-frame perception output and window focus
//! polls into classified violation events, then aggregates a session's
//! events into a reproducible risk report: observation → frame/focus
//! detection → session event log → aggregation → report encoding.
//!
//! ## Modules
//!
//! - **Detection**: Frame violation detector with per-session movement tracking, focus monitor
//! - **Aggregation**: Session risk level and recommendations from violation counts
//! - **Sessions**: Per-session handles, injected perception, multi-session registry

pub mod aggregator;
pub mod config;
pub mod detector;
pub mod encoder;
pub mod error;
pub mod focus;
pub mod movement;
pub mod perception;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod session;
pub mod types;

pub use aggregator::SessionAggregator;
pub use config::ProctorConfig;
pub use detector::{FrameViolationDetector, TrackerState};
pub use error::ProctorError;
pub use focus::FocusMonitor;
pub use pipeline::{observations_to_report, observations_to_report_with_config, ProctorProcessor};
pub use registry::SessionRegistry;
pub use session::{ProctorSession, RecordedViolation, SessionMonitor};
pub use types::{
    BoundingBox, SessionReport, Severity, SuspicionLevel, ViolationEvent, ViolationType,
    WindowState,
};

// Schema exports
pub use schema::{Observation, ObservationAdapter, SCHEMA_VERSION};

/// Proctor version embedded in all report payloads
pub const PROCTOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "synheart-proctor";
