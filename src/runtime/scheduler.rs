use std::cell::RefCell;
use std::rc::Rc;

use super::instance::InstanceId;

/// Queue of portals waiting to re-read the registry.
///
/// Registry listeners only push onto this queue; the runtime drains it during
/// synchronization passes, so notification never re-enters the reconciler.
#[derive(Clone, Default)]
pub(crate) struct Scheduler {
    queue: Rc<RefCell<Vec<InstanceId>>>,
}

impl Scheduler {
    pub(crate) fn schedule(&self, id: InstanceId) {
        let mut queue = self.queue.borrow_mut();
        if !queue.contains(&id) {
            queue.push(id);
        }
    }

    pub(crate) fn drain(&self) -> Vec<InstanceId> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }

    pub(crate) fn clear(&self) {
        self.queue.borrow_mut().clear();
    }

    pub(crate) fn listener(&self, id: InstanceId) -> impl Fn() + 'static {
        let scheduler = self.clone();
        move || scheduler.schedule(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_deduplicates_and_drains_in_order() {
        let scheduler = Scheduler::default();
        scheduler.schedule(InstanceId::from_raw(2));
        scheduler.schedule(InstanceId::from_raw(1));
        scheduler.schedule(InstanceId::from_raw(2));
        assert_eq!(
            scheduler.drain(),
            vec![InstanceId::from_raw(2), InstanceId::from_raw(1)]
        );
        assert!(scheduler.drain().is_empty());
    }

    #[test]
    fn listener_schedules_its_instance() {
        let scheduler = Scheduler::default();
        let listener = scheduler.listener(InstanceId::from_raw(7));
        listener();
        listener();
        assert_eq!(scheduler.drain(), vec![InstanceId::from_raw(7)]);
    }
}
