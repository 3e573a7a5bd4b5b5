use serde_json::json;

use crate::context::ContextMap;
use crate::error::Result;
use crate::registry::{SlotRegistry, Subscription, use_portal_slots};
use crate::view::PortalView;

use super::audit::CommitStage;
use super::instance::{Instance, InstanceId, InstanceKind, PortalInstance};
use super::{RenderMode, Runtime};

impl Runtime {
    pub(super) fn mount_portal(
        &mut self,
        id: InstanceId,
        view: PortalView,
        context: &ContextMap,
    ) -> Result<()> {
        let registry = use_portal_slots(context)?;
        let subscription = self.subscribe_portal(id, &registry);
        let portal = PortalInstance {
            id: view.id,
            children: view.children,
            registry,
            subscription,
            target: None,
        };
        self.instances
            .insert(id, Instance::new(InstanceKind::Portal(portal), context));
        self.sync_portal(id)
    }

    pub(super) fn update_portal(
        &mut self,
        id: InstanceId,
        view: PortalView,
        context: &ContextMap,
    ) -> Result<()> {
        let registry = use_portal_slots(context)?;
        let resubscribe = match self.instances.get(&id).map(|i| &i.kind) {
            Some(InstanceKind::Portal(portal)) => {
                !SlotRegistry::ptr_eq(&portal.registry, &registry)
            }
            _ => return Ok(()),
        };
        let subscription = if resubscribe {
            self.subscribe_portal(id, &registry)
        } else {
            None
        };
        if let Some(InstanceKind::Portal(portal)) =
            self.instances.get_mut(&id).map(|i| &mut i.kind)
        {
            portal.children = view.children;
            if resubscribe {
                portal.registry = registry;
                portal.subscription = subscription;
            }
        }
        self.sync_portal(id)
    }

    fn subscribe_portal(
        &self,
        id: InstanceId,
        registry: &SlotRegistry,
    ) -> Option<Subscription> {
        match self.mode {
            RenderMode::Interactive => Some(registry.subscribe(self.scheduler.listener(id))),
            RenderMode::Static => None,
        }
    }

    /// Pull side of the portal: read the registry afresh and bring the
    /// projected content in line with whatever mount point it reports.
    pub(super) fn sync_portal(&mut self, id: InstanceId) -> Result<()> {
        let Some(instance) = self.instances.get_mut(&id) else {
            return Ok(());
        };
        let InstanceKind::Portal(portal) = &instance.kind else {
            return Ok(());
        };
        // A slot nested in content that was just removed can still hold its
        // entry until its own cleanup runs later in the pass.
        let current = portal
            .registry
            .get(&portal.id)
            .filter(|mount| self.document.contains(*mount));
        let previous = portal.target;
        let views = portal.children.clone();
        let slot_label = portal.id.to_string();
        let context = instance.context.clone();
        let children = std::mem::take(&mut instance.children);

        let next = if current == previous {
            match current {
                Some(target) => {
                    let before = self.host_nodes(&children);
                    let next = self.reconcile_children(children, views, &context)?;
                    let after = self.host_nodes(&next);
                    if before != after {
                        self.document.move_to_end(target, &after)?;
                    }
                    next
                }
                None => {
                    for child in children {
                        self.unmount_instance(child);
                    }
                    Vec::new()
                }
            }
        } else {
            for child in children {
                self.unmount_instance(child);
            }
            match current {
                Some(target) => {
                    let next = self.reconcile_children(Vec::new(), views, &context)?;
                    let hosts = self.host_nodes(&next);
                    self.document.move_to_end(target, &hosts)?;
                    self.audit(
                        CommitStage::PortalProjected,
                        [
                            ("slot", json!(slot_label)),
                            ("mount", json!(target.to_string())),
                        ],
                    );
                    next
                }
                None => {
                    self.audit(CommitStage::PortalCleared, [("slot", json!(slot_label))]);
                    Vec::new()
                }
            }
        };

        if let Some(instance) = self.instances.get_mut(&id) {
            instance.children = next;
            if let InstanceKind::Portal(portal) = &mut instance.kind {
                portal.target = current;
            }
        }
        Ok(())
    }

    /// Drop the subscription; projected children were already unmounted with
    /// the instance's subtree.
    pub(super) fn unmount_portal(&mut self, id: InstanceId, portal: PortalInstance) {
        let PortalInstance {
            id: slot_id,
            subscription,
            target,
            ..
        } = portal;
        drop(subscription);
        if target.is_some() {
            self.audit(
                CommitStage::PortalCleared,
                [
                    ("slot", json!(slot_id.to_string())),
                    ("instance", json!(id.to_string())),
                ],
            );
        }
    }
}
