use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type SharedMetrics = Arc<Mutex<SlotMetrics>>;

/// Counters for registry traffic and update cycles.
#[derive(Debug, Default, Clone)]
pub struct SlotMetrics {
    registrations: u64,
    releases: u64,
    duplicate_rejections: u64,
    notifications: u64,
    listener_calls: u64,
    subscriptions: u64,
    unsubscriptions: u64,
    commits: u64,
    sync_passes: u64,
    frames_painted: u64,
    frames_skipped: u64,
}

impl SlotMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedMetrics {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn record_registration(&mut self) {
        self.registrations = self.registrations.saturating_add(1);
    }

    pub fn record_release(&mut self) {
        self.releases = self.releases.saturating_add(1);
    }

    pub fn record_duplicate(&mut self) {
        self.duplicate_rejections = self.duplicate_rejections.saturating_add(1);
    }

    pub fn record_notification(&mut self, listeners_called: usize) {
        self.notifications = self.notifications.saturating_add(1);
        self.listener_calls = self.listener_calls.saturating_add(listeners_called as u64);
    }

    pub fn record_subscription(&mut self) {
        self.subscriptions = self.subscriptions.saturating_add(1);
    }

    pub fn record_unsubscription(&mut self) {
        self.unsubscriptions = self.unsubscriptions.saturating_add(1);
    }

    pub fn record_commit(&mut self, sync_passes: usize) {
        self.commits = self.commits.saturating_add(1);
        self.sync_passes = self.sync_passes.saturating_add(sync_passes as u64);
    }

    pub fn record_frame(&mut self, painted: bool) {
        if painted {
            self.frames_painted = self.frames_painted.saturating_add(1);
        } else {
            self.frames_skipped = self.frames_skipped.saturating_add(1);
        }
    }

    /// Registrations minus releases: the number of slots currently held.
    pub fn live_registrations(&self) -> u64 {
        self.registrations.saturating_sub(self.releases)
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            registrations: self.registrations,
            releases: self.releases,
            duplicate_rejections: self.duplicate_rejections,
            notifications: self.notifications,
            listener_calls: self.listener_calls,
            subscriptions: self.subscriptions,
            unsubscriptions: self.unsubscriptions,
            commits: self.commits,
            sync_passes: self.sync_passes,
            frames_painted: self.frames_painted,
            frames_skipped: self.frames_skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub registrations: u64,
    pub releases: u64,
    pub duplicate_rejections: u64,
    pub notifications: u64,
    pub listener_calls: u64,
    pub subscriptions: u64,
    pub unsubscriptions: u64,
    pub commits: u64,
    pub sync_passes: u64,
    pub frames_painted: u64,
    pub frames_skipped: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "slot_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("registrations".to_string(), json!(self.registrations));
        map.insert("releases".to_string(), json!(self.releases));
        map.insert(
            "duplicate_rejections".to_string(),
            json!(self.duplicate_rejections),
        );
        map.insert("notifications".to_string(), json!(self.notifications));
        map.insert("listener_calls".to_string(), json!(self.listener_calls));
        map.insert("subscriptions".to_string(), json!(self.subscriptions));
        map.insert("unsubscriptions".to_string(), json!(self.unsubscriptions));
        map.insert("commits".to_string(), json!(self.commits));
        map.insert("sync_passes".to_string(), json!(self.sync_passes));
        map.insert("frames_painted".to_string(), json!(self.frames_painted));
        map.insert("frames_skipped".to_string(), json!(self.frames_skipped));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_registrations_tracks_balance() {
        let mut metrics = SlotMetrics::new();
        metrics.record_registration();
        metrics.record_registration();
        metrics.record_release();
        assert_eq!(metrics.live_registrations(), 1);
    }

    #[test]
    fn snapshot_event_carries_counters() {
        let mut metrics = SlotMetrics::new();
        metrics.record_notification(3);
        metrics.record_notification(2);
        let event = metrics
            .snapshot(Duration::from_millis(40))
            .to_log_event("slots.metrics");
        assert_eq!(event.message, "slot_metrics");
        assert_eq!(event.field("notifications"), Some(&json!(2)));
        assert_eq!(event.field("listener_calls"), Some(&json!(5)));
        assert_eq!(event.field("uptime_ms"), Some(&json!(40)));
    }
}
