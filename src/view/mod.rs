mod core;

pub use core::{ElementView, PortalView, ProviderView, SlotView, View};
