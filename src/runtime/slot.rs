use serde_json::json;

use crate::context::ContextMap;
use crate::dom::Attributes;
use crate::error::Result;
use crate::registry::{SlotRegistration, SlotRegistry, use_portal_slots};
use crate::slot::slot_class_name;
use crate::view::SlotView;

use super::audit::CommitStage;
use super::instance::{Instance, InstanceId, InstanceKind, SlotInstance};
use super::{RenderMode, Runtime};

fn mount_attrs(view: &SlotView) -> Attributes {
    let mut attrs = view.attrs.clone();
    attrs.insert(
        "class".to_string(),
        slot_class_name(view.id.name(), &view.class),
    );
    attrs
}

impl Runtime {
    pub(super) fn mount_slot(
        &mut self,
        id: InstanceId,
        view: SlotView,
        context: &ContextMap,
    ) -> Result<()> {
        use_portal_slots(context)?;
        let node = self.document.create_element("div");
        self.document.replace_attrs(node, mount_attrs(&view))?;
        let slot = SlotInstance {
            id: view.id,
            node,
            registration: None,
        };
        self.instances
            .insert(id, Instance::new(InstanceKind::Slot(slot), context));
        self.render_host_children(id, node, view.children, context)?;
        if self.mode == RenderMode::Interactive {
            self.layout_effects.push(id);
        }
        Ok(())
    }

    pub(super) fn update_slot(
        &mut self,
        id: InstanceId,
        view: SlotView,
        context: &ContextMap,
    ) -> Result<()> {
        let registry = use_portal_slots(context)?;
        let Some(InstanceKind::Slot(slot)) = self.instances.get(&id).map(|i| &i.kind) else {
            return Ok(());
        };
        let node = slot.node;
        // The mount element is stable across renders, so the entry only needs
        // renewing when the ambient registry itself changed.
        let needs_registration = slot
            .registration
            .as_ref()
            .map(|held| !SlotRegistry::ptr_eq(held.registry(), &registry))
            .unwrap_or(true);

        self.document.replace_attrs(node, mount_attrs(&view))?;
        self.render_host_children(id, node, view.children, context)?;
        if needs_registration && self.mode == RenderMode::Interactive {
            self.layout_effects.push(id);
        }
        Ok(())
    }

    /// Layout-phase effect: acquire the registry entry for the slot's mount
    /// element, releasing one held against a previous registry first.
    pub(super) fn register_slot(&mut self, id: InstanceId) -> Result<()> {
        let Some(instance) = self.instances.get_mut(&id) else {
            return Ok(());
        };
        let registry = use_portal_slots(&instance.context)?;
        let InstanceKind::Slot(slot) = &mut instance.kind else {
            return Ok(());
        };
        if let Some(held) = slot.registration.as_ref() {
            if SlotRegistry::ptr_eq(held.registry(), &registry) {
                return Ok(());
            }
        }
        let released = slot.registration.take().is_some();
        let registration = SlotRegistration::acquire(&registry, &slot.id, slot.node)?;
        let slot_label = slot.id.to_string();
        let mount_label = slot.node.to_string();
        slot.registration = Some(registration);

        if released {
            self.audit(CommitStage::SlotReleased, [("slot", json!(slot_label))]);
        }
        self.audit(
            CommitStage::SlotRegistered,
            [("slot", json!(slot_label)), ("mount", json!(mount_label))],
        );
        Ok(())
    }

    /// Remove the mount element, then release the entry so portals observe the
    /// slot as absent.
    pub(super) fn unmount_slot(&mut self, slot: SlotInstance) {
        let SlotInstance {
            id,
            node,
            registration,
        } = slot;
        self.document.remove(node);
        if let Some(registration) = registration {
            registration.release();
            self.audit(CommitStage::SlotReleased, [("slot", json!(id.to_string()))]);
        }
    }
}
