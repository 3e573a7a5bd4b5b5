use std::fmt;

use crate::context::ContextMap;
use crate::dom::{MountPoint, NodeId};
use crate::registry::{SlotRegistration, SlotRegistry, Subscription};
use crate::slot::SlotId;
use crate::view::View;

/// Identity of a mounted view within one runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

pub(crate) struct Instance {
    pub(crate) kind: InstanceKind,
    pub(crate) children: Vec<InstanceId>,
    /// Context the instance was last rendered in.
    pub(crate) context: ContextMap,
}

impl Instance {
    pub(crate) fn new(kind: InstanceKind, context: &ContextMap) -> Self {
        Self {
            kind,
            children: Vec::new(),
            context: context.clone(),
        }
    }

    /// Whether `view` can update this instance in place.
    pub(crate) fn accepts(&self, view: &View) -> bool {
        match (&self.kind, view) {
            (InstanceKind::Text { .. }, View::Text(_)) => true,
            (InstanceKind::Element { tag, .. }, View::Element(element)) => *tag == element.tag,
            (InstanceKind::Fragment, View::Fragment(_)) => true,
            (InstanceKind::Provider { .. }, View::Provider(_)) => true,
            (InstanceKind::Slot(slot), View::Slot(next)) => slot.id == next.id,
            (InstanceKind::Portal(portal), View::Portal(next)) => portal.id == next.id,
            _ => false,
        }
    }
}

pub(crate) enum InstanceKind {
    Text { node: NodeId },
    Element { node: NodeId, tag: String },
    Fragment,
    Provider { registry: SlotRegistry },
    Slot(SlotInstance),
    Portal(PortalInstance),
}

pub(crate) struct SlotInstance {
    pub(crate) id: SlotId,
    pub(crate) node: NodeId,
    pub(crate) registration: Option<SlotRegistration>,
}

pub(crate) struct PortalInstance {
    pub(crate) id: SlotId,
    /// Children as last rendered; re-projected whenever the target changes.
    pub(crate) children: Vec<View>,
    pub(crate) registry: SlotRegistry,
    pub(crate) subscription: Option<Subscription>,
    pub(crate) target: Option<MountPoint>,
}
