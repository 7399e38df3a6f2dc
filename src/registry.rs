//! Arena of concurrently monitored sessions keyed by session id
//!
//! Each entry owns its own [`SessionMonitor`]; closing a session returns its
//! final report and discards its tracker state. A runtime serving sessions
//! from several threads should give each session a single owner (one
//! registry per worker, or one task per session) instead of sharing entries.

use crate::config::ProctorConfig;
use crate::error::ProctorError;
use crate::session::SessionMonitor;
use crate::types::SessionReport;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Default)]
pub struct SessionRegistry {
    config: ProctorConfig,
    sessions: HashMap<String, SessionMonitor>,
}

impl SessionRegistry {
    pub fn new(config: ProctorConfig) -> Result<Self, ProctorError> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: HashMap::new(),
        })
    }

    pub fn config(&self) -> &ProctorConfig {
        &self.config
    }

    /// Start monitoring a new session
    pub fn open(&mut self, session_id: &str) -> Result<&mut SessionMonitor, ProctorError> {
        if self.sessions.contains_key(session_id) {
            return Err(ProctorError::DuplicateSession(session_id.to_string()));
        }
        let monitor = SessionMonitor::new(session_id, &self.config)?;
        log::info!("opened proctoring session {session_id}");
        Ok(self
            .sessions
            .entry(session_id.to_string())
            .or_insert(monitor))
    }

    pub fn get(&self, session_id: &str) -> Result<&SessionMonitor, ProctorError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| ProctorError::UnknownSession(session_id.to_string()))
    }

    pub fn get_mut(&mut self, session_id: &str) -> Result<&mut SessionMonitor, ProctorError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| ProctorError::UnknownSession(session_id.to_string()))
    }

    /// Stop monitoring a session and return its final report
    pub fn close(&mut self, session_id: &str) -> Result<SessionReport, ProctorError> {
        let monitor = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| ProctorError::UnknownSession(session_id.to_string()))?;
        let report = monitor.into_report();
        log::info!(
            "closed proctoring session {session_id}: {} violations, {:?} suspicion",
            report.total_violations,
            report.suspicious_level
        );
        Ok(report)
    }

    /// Current report for every open session
    pub fn reports(&self) -> BTreeMap<String, SessionReport> {
        self.sessions
            .iter()
            .map(|(id, monitor)| (id.clone(), monitor.report()))
            .collect()
    }

    /// Open session ids in sorted order
    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
