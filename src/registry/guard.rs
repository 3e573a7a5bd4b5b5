use crate::dom::MountPoint;
use crate::error::Result;
use crate::slot::SlotId;

use super::SlotRegistry;

/// A held registry entry. Acquiring it calls `set`; dropping it calls `delete`.
///
/// Producers keep one of these for as long as their mount element is live, so
/// the entry is released on every exit path, including teardown after an error.
#[derive(Debug)]
pub struct SlotRegistration {
    registry: SlotRegistry,
    id: SlotId,
    mount: MountPoint,
}

impl SlotRegistration {
    pub fn acquire(registry: &SlotRegistry, id: &SlotId, mount: MountPoint) -> Result<Self> {
        registry.set(id, mount)?;
        Ok(Self {
            registry: registry.clone(),
            id: id.clone(),
            mount,
        })
    }

    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn mount(&self) -> MountPoint {
        self.mount
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    /// Release explicitly; equivalent to dropping the guard.
    pub fn release(self) {}
}

impl Drop for SlotRegistration {
    fn drop(&mut self) {
        self.registry.delete(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::error::SlotError;

    #[test]
    fn drop_releases_entry() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let mount = Document::new().create_element("div");
        {
            let guard = SlotRegistration::acquire(&registry, &id, mount).unwrap();
            assert_eq!(guard.mount(), mount);
            assert_eq!(registry.get(&id), Some(mount));
        }
        assert_eq!(registry.get(&id), None);
    }

    #[test]
    fn failed_acquire_leaves_existing_entry_alone() {
        let registry = SlotRegistry::new();
        let id = SlotId::mint("footer");
        let mut doc = Document::new();
        let first_mount = doc.create_element("div");
        let second_mount = doc.create_element("div");

        let first = SlotRegistration::acquire(&registry, &id, first_mount).unwrap();
        let err = SlotRegistration::acquire(&registry, &id, second_mount).unwrap_err();
        assert!(matches!(err, SlotError::DuplicateSlot(_)));
        assert_eq!(registry.get(&id), Some(first_mount));

        first.release();
        assert!(registry.is_empty());
    }
}
