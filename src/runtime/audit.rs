//! Update-cycle audit utilities.
//!
//! Records capture a stage identifier plus structured metadata so callers can
//! observe the order in which a commit registers slots, projects portals and
//! paints frames without instrumenting the runtime itself.

use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

/// Distinct checkpoints emitted by [`Runtime`](super::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStage {
    /// A render or flush began.
    CommitStarted,
    /// A slot acquired its registry entry during the layout phase.
    SlotRegistered,
    /// A slot released its registry entry.
    SlotReleased,
    /// A portal placed its children inside a mount point.
    PortalProjected,
    /// A portal lost its mount point and dropped its projected content.
    PortalCleared,
    /// One synchronization pass over scheduled portals finished.
    SyncPass,
    /// The document changed and a frame was recorded.
    FramePainted,
    /// Paint found the document unchanged.
    FrameSkipped,
    /// The whole tree was unmounted, either on request or after an error.
    TreeTornDown,
}

#[derive(Debug, Clone)]
pub struct CommitAuditEvent {
    pub timestamp: SystemTime,
    pub stage: CommitStage,
    pub details: Vec<(String, Value)>,
}

impl CommitAuditEvent {
    fn new(stage: CommitStage) -> Self {
        Self {
            timestamp: SystemTime::now(),
            stage,
            details: Vec::new(),
        }
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }
}

pub struct CommitAuditEventBuilder {
    event: CommitAuditEvent,
}

impl CommitAuditEventBuilder {
    pub fn new(stage: CommitStage) -> Self {
        Self {
            event: CommitAuditEvent::new(stage),
        }
    }

    pub fn detail(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.event.details.push((key.into(), value));
        self
    }

    pub fn finish(self) -> CommitAuditEvent {
        self.event
    }
}

pub trait RuntimeAudit: Send + Sync {
    fn record(&self, event: CommitAuditEvent);
}

#[derive(Debug, Default)]
pub struct NullRuntimeAudit;

impl RuntimeAudit for NullRuntimeAudit {
    fn record(&self, _event: CommitAuditEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<CommitAuditEvent>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CommitAuditEvent> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn stages(&self) -> Vec<CommitStage> {
        self.events().into_iter().map(|event| event.stage).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl RuntimeAudit for RecordingAudit {
    fn record(&self, event: CommitAuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_collects_details() {
        let mut builder = CommitAuditEventBuilder::new(CommitStage::SlotRegistered);
        builder.detail("slot", json!("footer#1"));
        let event = builder.finish();
        assert_eq!(event.stage, CommitStage::SlotRegistered);
        assert_eq!(event.detail("slot"), Some(&json!("footer#1")));
    }

    #[test]
    fn recording_audit_preserves_order() {
        let audit = RecordingAudit::new();
        audit.record(CommitAuditEventBuilder::new(CommitStage::CommitStarted).finish());
        audit.record(CommitAuditEventBuilder::new(CommitStage::FramePainted).finish());
        assert_eq!(
            audit.stages(),
            vec![CommitStage::CommitStarted, CommitStage::FramePainted]
        );
        audit.clear();
        assert!(audit.events().is_empty());
    }
}
