//! Slot identities and the channel factory.

mod factory;
mod id;

pub use factory::{Portal, PortalSlot, SLOT_CLASS_PREFIX, Slot, portal_slot};
pub use id::SlotId;

pub(crate) use factory::slot_class_name;
