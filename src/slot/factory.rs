use crate::view::{PortalView, SlotView};

use super::SlotId;

/// Class token every slot mount element carries ahead of its name.
pub const SLOT_CLASS_PREFIX: &str = "portal-slots-slot";

const DEFAULT_SLOT_NAME: &str = "portal";

/// Producer half of a channel: renders the mount element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    id: SlotId,
}

impl Slot {
    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn view(&self) -> SlotView {
        SlotView::new(self.id.clone())
    }

    /// Class attribute for the mount element, merged with a caller class.
    pub fn class_name(&self, extra: &str) -> String {
        slot_class_name(self.id.name(), extra)
    }
}

/// Consumer half of a channel: projects children into the mounted slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    id: SlotId,
}

impl Portal {
    pub fn id(&self) -> &SlotId {
        &self.id
    }

    pub fn view(&self) -> PortalView {
        PortalView::new(self.id.clone())
    }
}

/// A bound producer/consumer pair sharing one [`SlotId`].
#[derive(Debug, Clone)]
pub struct PortalSlot {
    pub portal: Portal,
    pub slot: Slot,
}

impl PortalSlot {
    pub fn new(name: impl Into<String>) -> Self {
        let id = SlotId::mint(name);
        Self {
            portal: Portal { id: id.clone() },
            slot: Slot { id },
        }
    }

    pub fn id(&self) -> &SlotId {
        &self.slot.id
    }

    pub fn name(&self) -> &str {
        self.slot.id.name()
    }
}

impl Default for PortalSlot {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_NAME)
    }
}

/// Mint a fresh channel. Touches no registry; resolution happens at render time.
pub fn portal_slot(name: impl Into<String>) -> PortalSlot {
    PortalSlot::new(name)
}

pub(crate) fn slot_class_name(name: &str, extra: &str) -> String {
    format!("{} {} {}", SLOT_CLASS_PREFIX, name, extra)
        .trim()
        .to_string()
}
