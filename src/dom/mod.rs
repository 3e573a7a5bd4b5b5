//! Retained host document that mount points live in.

mod core;

pub use core::{Attributes, Document, MountPoint, Node, NodeId, NodeKind};
