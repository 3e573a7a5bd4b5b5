use crate::context::ContextMap;
use crate::dom::NodeId;
use crate::error::Result;
use crate::registry::{SlotRegistry, provide_portal_slots};
use crate::view::View;

use super::Runtime;
use super::instance::{Instance, InstanceId, InstanceKind};

impl Runtime {
    /// Positional reconciliation: a child is updated in place when the view at
    /// the same index accepts it, otherwise it is replaced.
    pub(super) fn reconcile_children(
        &mut self,
        existing: Vec<InstanceId>,
        views: Vec<View>,
        context: &ContextMap,
    ) -> Result<Vec<InstanceId>> {
        let mut next = Vec::with_capacity(views.len());
        let mut previous = existing.into_iter();

        for view in views {
            match previous.next() {
                Some(id) if self.accepts(id, &view) => {
                    self.update(id, view, context)?;
                    next.push(id);
                }
                Some(stale) => {
                    self.unmount_instance(stale);
                    next.push(self.mount(view, context)?);
                }
                None => next.push(self.mount(view, context)?),
            }
        }

        for stale in previous {
            self.unmount_instance(stale);
        }
        Ok(next)
    }

    fn accepts(&self, id: InstanceId, view: &View) -> bool {
        self.instances
            .get(&id)
            .map(|instance| instance.accepts(view))
            .unwrap_or(false)
    }

    pub(super) fn mount(&mut self, view: View, context: &ContextMap) -> Result<InstanceId> {
        let id = self.next_instance_id();
        match view {
            View::Text(text) => {
                let node = self.document.create_text(&text);
                self.instances
                    .insert(id, Instance::new(InstanceKind::Text { node }, context));
            }
            View::Element(element) => {
                let node = self.document.create_element(&element.tag);
                self.document.replace_attrs(node, element.attrs)?;
                let kind = InstanceKind::Element {
                    node,
                    tag: element.tag,
                };
                self.instances.insert(id, Instance::new(kind, context));
                self.render_host_children(id, node, element.children, context)?;
            }
            View::Fragment(children) => {
                self.instances
                    .insert(id, Instance::new(InstanceKind::Fragment, context));
                self.render_children(id, children, context)?;
            }
            View::Provider(provider) => {
                let registry = self.new_registry();
                let scope = provide_portal_slots(context, registry.clone());
                self.instances
                    .insert(id, Instance::new(InstanceKind::Provider { registry }, context));
                self.render_children(id, provider.children, &scope)?;
            }
            View::Slot(slot) => self.mount_slot(id, slot, context)?,
            View::Portal(portal) => self.mount_portal(id, portal, context)?,
        }
        Ok(id)
    }

    fn update(&mut self, id: InstanceId, view: View, context: &ContextMap) -> Result<()> {
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.context = context.clone();
        }
        match view {
            View::Text(text) => {
                if let Some(node) = self.host_node(id) {
                    self.document.set_text(node, &text)?;
                }
            }
            View::Element(element) => {
                if let Some(node) = self.host_node(id) {
                    self.document.replace_attrs(node, element.attrs)?;
                    self.render_host_children(id, node, element.children, context)?;
                }
            }
            View::Fragment(children) => self.render_children(id, children, context)?,
            View::Provider(provider) => {
                // The registry is created once per mounted provider and kept
                // across re-renders; only the scope around it is rebuilt.
                let Some(registry) = self.provider_registry(id) else {
                    return Ok(());
                };
                let scope = provide_portal_slots(context, registry);
                self.render_children(id, provider.children, &scope)?;
            }
            View::Slot(slot) => self.update_slot(id, slot, context)?,
            View::Portal(portal) => self.update_portal(id, portal, context)?,
        }
        Ok(())
    }

    /// Reconcile the children of `id` without touching host placement.
    pub(super) fn render_children(
        &mut self,
        id: InstanceId,
        views: Vec<View>,
        context: &ContextMap,
    ) -> Result<()> {
        let previous = match self.instances.get_mut(&id) {
            Some(instance) => std::mem::take(&mut instance.children),
            None => return Ok(()),
        };
        let next = self.reconcile_children(previous, views, context)?;
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.children = next;
        }
        Ok(())
    }

    /// Reconcile the children of `id` and place their host nodes first under
    /// `node`, ahead of any content projected into it.
    pub(super) fn render_host_children(
        &mut self,
        id: InstanceId,
        node: NodeId,
        views: Vec<View>,
        context: &ContextMap,
    ) -> Result<()> {
        self.render_children(id, views, context)?;
        let children = self
            .instances
            .get(&id)
            .map(|instance| instance.children.clone())
            .unwrap_or_default();
        let hosts = self.host_nodes(&children);
        self.document.arrange_leading(node, &hosts)
    }

    /// Run cleanups for `id` and its subtree, children first.
    pub(super) fn unmount_instance(&mut self, id: InstanceId) {
        let Some(instance) = self.instances.remove(&id) else {
            return;
        };
        for child in instance.children {
            self.unmount_instance(child);
        }
        match instance.kind {
            InstanceKind::Text { node } | InstanceKind::Element { node, .. } => {
                self.document.remove(node);
            }
            InstanceKind::Fragment | InstanceKind::Provider { .. } => {}
            InstanceKind::Slot(slot) => self.unmount_slot(slot),
            InstanceKind::Portal(portal) => self.unmount_portal(id, portal),
        }
    }

    fn host_node(&self, id: InstanceId) -> Option<NodeId> {
        match &self.instances.get(&id)?.kind {
            InstanceKind::Text { node } | InstanceKind::Element { node, .. } => Some(*node),
            InstanceKind::Slot(slot) => Some(slot.node),
            _ => None,
        }
    }

    /// Top-level host nodes produced by `ids`, in order. Portals contribute
    /// nothing at their own position.
    pub(super) fn host_nodes(&self, ids: &[InstanceId]) -> Vec<NodeId> {
        let mut hosts = Vec::new();
        for id in ids {
            let Some(instance) = self.instances.get(id) else {
                continue;
            };
            match &instance.kind {
                InstanceKind::Text { node } | InstanceKind::Element { node, .. } => {
                    hosts.push(*node)
                }
                InstanceKind::Slot(slot) => hosts.push(slot.node),
                InstanceKind::Fragment | InstanceKind::Provider { .. } => {
                    hosts.extend(self.host_nodes(&instance.children));
                }
                InstanceKind::Portal(_) => {}
            }
        }
        hosts
    }

    fn provider_registry(&self, id: InstanceId) -> Option<SlotRegistry> {
        match &self.instances.get(&id)?.kind {
            InstanceKind::Provider { registry } => Some(registry.clone()),
            _ => None,
        }
    }
}
