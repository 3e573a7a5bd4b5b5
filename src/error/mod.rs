//! Error module orchestrator.
//!
//! Everything fallible in the crate funnels into [`SlotError`].

mod types;

pub use types::{Result, SlotError};
