//! Ambient context propagation for component instances.

mod core;

pub use core::ContextMap;
