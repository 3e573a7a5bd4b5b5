use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::dom::MountPoint;
use crate::error::{Result, SlotError};
use crate::logging::{LogLevel, Logger, REGISTRY_TARGET, event_with_fields, json_str};
use crate::metrics::{SharedMetrics, SlotMetrics};
use crate::slot::SlotId;

pub type Listener = Rc<dyn Fn()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct RegistryState {
    slots: HashMap<SlotId, MountPoint>,
    listeners: Vec<(ListenerId, Listener)>,
    /// Ids in `listeners`, for constant-time checks during a notify round.
    subscribed: HashSet<ListenerId>,
    next_listener: u64,
}

struct RegistryInner {
    state: RefCell<RegistryState>,
    logger: Option<Logger>,
    metrics: Option<SharedMetrics>,
}

/// Shared store mapping slot ids to live mount points, plus the listeners
/// interested in any change to it.
///
/// Cloning the handle shares the same store. Every successful `set` and every
/// `delete` that removes an entry notifies all listeners before returning.
/// Listeners receive no payload; they are expected to call [`SlotRegistry::get`]
/// to read the current state.
#[derive(Clone)]
pub struct SlotRegistry {
    inner: Rc<RegistryInner>,
}

impl Default for SlotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::with_observability(None, None)
    }

    pub fn with_observability(logger: Option<Logger>, metrics: Option<SharedMetrics>) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                state: RefCell::new(RegistryState::default()),
                logger,
                metrics,
            }),
        }
    }

    pub fn ptr_eq(a: &SlotRegistry, b: &SlotRegistry) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn get(&self, id: &SlotId) -> Option<MountPoint> {
        self.inner.state.borrow().slots.get(id).copied()
    }

    pub fn contains(&self, id: &SlotId) -> bool {
        self.inner.state.borrow().slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn listener_count(&self) -> usize {
        self.inner.state.borrow().listeners.len()
    }

    pub fn set(&self, id: &SlotId, mount: MountPoint) -> Result<()> {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.slots.contains_key(id) {
                drop(state);
                self.with_metrics(|metrics| metrics.record_duplicate());
                self.log(
                    LogLevel::Warn,
                    "duplicate_rejected",
                    [json_str("slot", id.to_string())],
                );
                return Err(SlotError::DuplicateSlot(id.clone()));
            }
            state.slots.insert(id.clone(), mount);
        }
        self.with_metrics(|metrics| metrics.record_registration());
        self.log(
            LogLevel::Debug,
            "slot_registered",
            [
                json_str("slot", id.to_string()),
                json_str("mount", mount.to_string()),
            ],
        );
        self.notify();
        Ok(())
    }

    pub fn delete(&self, id: &SlotId) {
        let removed = self.inner.state.borrow_mut().slots.remove(id);
        let Some(mount) = removed else {
            return;
        };
        self.with_metrics(|metrics| metrics.record_release());
        self.log(
            LogLevel::Debug,
            "slot_released",
            [
                json_str("slot", id.to_string()),
                json_str("mount", mount.to_string()),
            ],
        );
        self.notify();
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        let id = {
            let mut state = self.inner.state.borrow_mut();
            let id = ListenerId(state.next_listener);
            state.next_listener += 1;
            state.listeners.push((id, Rc::new(listener)));
            state.subscribed.insert(id);
            id
        };
        self.with_metrics(|metrics| metrics.record_subscription());
        Subscription {
            registry: Rc::downgrade(&self.inner),
            id,
            active: true,
        }
    }

    fn notify(&self) {
        let snapshot: Vec<(ListenerId, Listener)> = self.inner.state.borrow().listeners.clone();
        let mut called = 0;
        for (id, listener) in snapshot {
            if !self.inner.is_subscribed(id) {
                continue;
            }
            listener();
            called += 1;
        }
        self.with_metrics(|metrics| metrics.record_notification(called));
    }

    fn with_metrics(&self, record: impl FnOnce(&mut SlotMetrics)) {
        self.inner.with_metrics(record);
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.inner.logger.as_ref() {
            if logger.enabled(level) {
                let event = event_with_fields(level, REGISTRY_TARGET, message, fields);
                let _ = logger.log_event(event);
            }
        }
    }
}

impl RegistryInner {
    fn is_subscribed(&self, id: ListenerId) -> bool {
        self.state.borrow().subscribed.contains(&id)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        // The listener is dropped after the borrow ends: its captures may own
        // subscriptions of their own.
        let removed = {
            let mut state = self.state.borrow_mut();
            if !state.subscribed.remove(&id) {
                return false;
            }
            let position = state
                .listeners
                .iter()
                .position(|(existing, _)| *existing == id);
            position.map(|idx| state.listeners.remove(idx))
        };
        if removed.is_some() {
            self.with_metrics(|metrics| metrics.record_unsubscription());
        }
        removed.is_some()
    }

    fn with_metrics(&self, record: impl FnOnce(&mut SlotMetrics)) {
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }
}

impl std::fmt::Debug for SlotRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("SlotRegistry")
            .field("slots", &state.slots)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

/// Capability that removes exactly one listener. Dropping it unsubscribes.
pub struct Subscription {
    registry: Weak<RegistryInner>,
    id: ListenerId,
    active: bool,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Idempotent; a no-op once the registry itself is gone.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(inner) = self.registry.upgrade() {
            inner.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::logging::MemorySink;
    use crate::metrics::SlotMetrics;
    use std::cell::{Cell, RefCell};

    fn mounts() -> (MountPoint, MountPoint) {
        let mut doc = Document::new();
        (doc.create_element("div"), doc.create_element("div"))
    }

    fn counter(registry: &SlotRegistry) -> (Rc<Cell<usize>>, Subscription) {
        let hits = Rc::new(Cell::new(0));
        let seen = Rc::clone(&hits);
        let sub = registry.subscribe(move || seen.set(seen.get() + 1));
        (hits, sub)
    }

    #[test]
    fn get_reflects_set_and_delete() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, _) = mounts();
        assert_eq!(registry.get(&id), None);
        registry.set(&id, a).unwrap();
        assert_eq!(registry.get(&id), Some(a));
        registry.delete(&id);
        assert_eq!(registry.get(&id), None);
    }

    #[test]
    fn duplicate_set_fails_without_mutation_or_notification() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, b) = mounts();
        registry.set(&id, a).unwrap();
        let (hits, _sub) = counter(&registry);

        let err = registry.set(&id, b).unwrap_err();
        assert!(matches!(err, SlotError::DuplicateSlot(ref dup) if *dup == id));
        assert_eq!(registry.get(&id), Some(a));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn set_after_delete_succeeds() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, b) = mounts();
        registry.set(&id, a).unwrap();
        registry.delete(&id);
        registry.set(&id, b).unwrap();
        assert_eq!(registry.get(&id), Some(b));
    }

    #[test]
    fn every_mutation_notifies_every_listener_once() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, _) = mounts();
        let (first, _s1) = counter(&registry);
        let (second, _s2) = counter(&registry);

        registry.set(&id, a).unwrap();
        assert_eq!((first.get(), second.get()), (1, 1));
        registry.delete(&id);
        assert_eq!((first.get(), second.get()), (2, 2));
    }

    #[test]
    fn deleting_absent_id_is_silent() {
        let registry = SlotRegistry::new();
        let (hits, _sub) = counter(&registry);
        let id = SlotId::mint("footer");
        registry.delete(&id);
        registry.delete(&id);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn listeners_read_fresh_state_during_notification() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, _) = mounts();
        let observed = Rc::new(RefCell::new(Vec::new()));

        let reader = registry.clone();
        let read_id = id.clone();
        let log = Rc::clone(&observed);
        let _sub = registry.subscribe(move || log.borrow_mut().push(reader.get(&read_id)));

        registry.set(&id, a).unwrap();
        registry.delete(&id);
        assert_eq!(*observed.borrow(), vec![Some(a), None]);
    }

    #[test]
    fn unsubscribe_is_idempotent_and_stops_delivery() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, _) = mounts();
        let (hits, mut sub) = counter(&registry);

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(registry.listener_count(), 0);
        registry.set(&id, a).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let registry = SlotRegistry::new();
        {
            let _sub = registry.subscribe(|| {});
            assert_eq!(registry.listener_count(), 1);
        }
        assert_eq!(registry.listener_count(), 0);
    }

    #[test]
    fn subscription_outliving_registry_is_inert() {
        let registry = SlotRegistry::new();
        let mut sub = registry.subscribe(|| {});
        drop(registry);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[test]
    fn listener_removed_mid_round_is_skipped() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, _) = mounts();

        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let handle = Rc::clone(&victim);
        let _killer = registry.subscribe(move || {
            if let Some(mut sub) = handle.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        let (hits, sub) = counter(&registry);
        *victim.borrow_mut() = Some(sub);

        registry.set(&id, a).unwrap();
        assert_eq!(hits.get(), 0);
        assert_eq!(registry.listener_count(), 1);
    }

    #[test]
    fn listener_added_mid_round_waits_for_next_round() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, _) = mounts();

        let late_hits = Rc::new(Cell::new(0));
        let parked: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
        let inner_registry = registry.clone();
        let inner_hits = Rc::clone(&late_hits);
        let inner_parked = Rc::clone(&parked);
        let _spawner = registry.subscribe(move || {
            if inner_parked.borrow().is_empty() {
                let hits = Rc::clone(&inner_hits);
                let sub = inner_registry.subscribe(move || hits.set(hits.get() + 1));
                inner_parked.borrow_mut().push(sub);
            }
        });

        registry.set(&id, a).unwrap();
        assert_eq!(late_hits.get(), 0);
        registry.delete(&id);
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn observability_records_traffic() {
        let sink = MemorySink::new();
        let metrics = SlotMetrics::shared();
        let registry =
            SlotRegistry::with_observability(Some(Logger::new(sink.clone())), Some(metrics.clone()));
        let id = SlotId::mint("footer");
        let (a, b) = mounts();
        let _sub = registry.subscribe(|| {});

        registry.set(&id, a).unwrap();
        let _ = registry.set(&id, b);
        registry.delete(&id);

        assert_eq!(
            sink.messages(),
            vec!["slot_registered", "duplicate_rejected", "slot_released"]
        );
        let snapshot = metrics
            .lock()
            .unwrap()
            .snapshot(std::time::Duration::ZERO);
        assert_eq!(snapshot.registrations, 1);
        assert_eq!(snapshot.duplicate_rejections, 1);
        assert_eq!(snapshot.releases, 1);
        assert_eq!(snapshot.notifications, 2);
        assert_eq!(snapshot.listener_calls, 2);
        assert_eq!(snapshot.subscriptions, 1);
    }

    #[test]
    fn wide_fanout_tracks_removals_within_one_round() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let (a, _) = mounts();
        let hits = Rc::new(Cell::new(0));
        let others: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let dropper = Rc::clone(&others);
        let first_hits = Rc::clone(&hits);
        let _first = registry.subscribe(move || {
            first_hits.set(first_hits.get() + 1);
            dropper.borrow_mut().clear();
        });
        for _ in 0..256 {
            let seen = Rc::clone(&hits);
            let sub = registry.subscribe(move || seen.set(seen.get() + 1));
            others.borrow_mut().push(sub);
        }
        assert_eq!(registry.listener_count(), 257);

        registry.set(&id, a).unwrap();
        assert_eq!(hits.get(), 1);
        assert_eq!(registry.listener_count(), 1);

        registry.delete(&id);
        assert_eq!(hits.get(), 2);
    }
}
