use thiserror::Error;

use crate::dom::NodeId;
use crate::slot::SlotId;

/// Unified result type for the portal slots crate.
pub type Result<T> = std::result::Result<T, SlotError>;

/// Errors surfaced while wiring slots and portals into a tree.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("usePortalSlots must be used within a PortalSlotsProvider")]
    MissingProvider,
    #[error("Portal slot {0} already exists")]
    DuplicateSlot(SlotId),
    #[error("node {0} is not attached to the document")]
    NodeNotFound(NodeId),
    #[error("update cycle did not settle after {0} synchronization passes")]
    SyncOverflow(usize),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SlotError {
    /// Usage errors point at a wiring mistake in the host application rather
    /// than at runtime state.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, SlotError::MissingProvider | SlotError::DuplicateSlot(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_host_facing_wording() {
        assert_eq!(
            SlotError::MissingProvider.to_string(),
            "usePortalSlots must be used within a PortalSlotsProvider"
        );
        let id = SlotId::mint("footer");
        let message = SlotError::DuplicateSlot(id.clone()).to_string();
        assert_eq!(message, format!("Portal slot {} already exists", id));
        assert!(message.contains("footer"));
    }

    #[test]
    fn usage_errors_are_classified() {
        assert!(SlotError::MissingProvider.is_usage_error());
        assert!(!SlotError::SyncOverflow(3).is_usage_error());
    }
}
