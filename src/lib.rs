//! Named mount points with out-of-band content projection for retained UI
//! trees.
//!
//! A [`PortalSlot`] pairs a producer ([`Slot`]) that owns a mount element with
//! a consumer ([`Portal`]) that projects its children into that element from
//! anywhere else under the same provider. The [`SlotRegistry`] behind a
//! provider tracks which mount point is live for each [`SlotId`], and the
//! [`Runtime`] drives update cycles so that a slot registered during a commit
//! is projected into before that commit paints.

pub mod context;
pub mod dom;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod slot;
pub mod view;

pub use context::ContextMap;
pub use dom::{Attributes, Document, MountPoint, Node, NodeId, NodeKind};
pub use error::{Result, SlotError};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{MetricSnapshot, SharedMetrics, SlotMetrics};
pub use registry::{
    ListenerId, SlotRegistration, SlotRegistry, Subscription, provide_portal_slots,
    use_portal_slots,
};
pub use render::{MarkupRenderer, RendererSettings};
pub use runtime::audit::{
    CommitAuditEvent, CommitAuditEventBuilder, CommitStage, NullRuntimeAudit, RecordingAudit,
    RuntimeAudit,
};
pub use runtime::{Frame, InstanceId, RenderMode, Runtime, RuntimeConfig};
pub use slot::{Portal, PortalSlot, SLOT_CLASS_PREFIX, Slot, SlotId, portal_slot};
pub use view::{ElementView, PortalView, ProviderView, SlotView, View};
