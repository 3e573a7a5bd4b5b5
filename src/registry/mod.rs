//! Registry module orchestrator.
//!
//! The store itself lives in `core`; `guard` holds the scoped registration used
//! by producers and `scope` the context helpers used by providers and consumers.

mod core;
mod guard;
mod scope;

pub use core::{Listener, ListenerId, SlotRegistry, Subscription};
pub use guard::SlotRegistration;
pub use scope::{provide_portal_slots, use_portal_slots};
