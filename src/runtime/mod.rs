use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;

use crate::context::ContextMap;
use crate::dom::Document;
use crate::logging::{
    LogLevel, Logger, METRICS_TARGET, RUNTIME_TARGET, event_with_fields, json_kv, json_str,
};
use crate::metrics::{SharedMetrics, SlotMetrics};
use crate::registry::SlotRegistry;
use crate::render::{MarkupRenderer, RendererSettings};
use crate::view::View;
use crate::{Result, SlotError};

pub mod audit;
mod instance;
mod portal;
mod reconcile;
mod scheduler;
mod slot;

pub use instance::InstanceId;

use audit::{CommitAuditEventBuilder, CommitStage, RuntimeAudit};
use instance::{Instance, InstanceKind};
use scheduler::Scheduler;

/// Configuration knobs for the runtime.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Optional structured logger shared with every provider's registry.
    pub logger: Option<Logger>,
    /// Counters shared with every provider's registry.
    pub metrics: Option<SharedMetrics>,
    /// Optional audit sink for commit stages.
    pub audit: Option<Arc<dyn RuntimeAudit>>,
    /// Upper bound on synchronization passes per commit.
    pub max_sync_passes: usize,
    /// Number of painted frames retained. Zero keeps none.
    pub frame_history: usize,
    /// Emit a metrics snapshot through the logger after each commit.
    pub emit_metrics: bool,
    pub renderer: RendererSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            logger: None,
            metrics: None,
            audit: None,
            max_sync_passes: 32,
            frame_history: 16,
            emit_metrics: true,
            renderer: RendererSettings::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn RuntimeAudit>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_max_sync_passes(mut self, passes: usize) -> Self {
        self.max_sync_passes = passes;
        self
    }

    pub fn with_frame_history(mut self, frames: usize) -> Self {
        self.frame_history = frames;
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(SlotMetrics::shared());
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<SharedMetrics> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Whether the layout phase runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Full update cycles: slots register, portals subscribe and project.
    Interactive,
    /// Reconcile only. Slots never register, so every portal renders absent.
    Static,
}

/// Serialized document recorded by the paint phase.
#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    pub markup: String,
    hash: blake3::Hash,
}

impl Frame {
    pub fn hash_hex(&self) -> String {
        self.hash.to_hex().to_string()
    }
}

/// Drives update cycles: reconcile, layout, synchronization passes, paint.
pub struct Runtime {
    document: Document,
    instances: HashMap<InstanceId, Instance>,
    roots: Vec<InstanceId>,
    next_instance: u64,
    scheduler: Scheduler,
    layout_effects: Vec<InstanceId>,
    mode: RenderMode,
    config: RuntimeConfig,
    renderer: MarkupRenderer,
    root_context: ContextMap,
    frames: VecDeque<Frame>,
    last_hash: Option<blake3::Hash>,
    frame_seq: u64,
    commits: u64,
    started_at: Instant,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_mode(config, RenderMode::Interactive)
    }

    pub fn with_mode(config: RuntimeConfig, mode: RenderMode) -> Self {
        let renderer = MarkupRenderer::new(config.renderer.clone());
        Self {
            document: Document::new(),
            instances: HashMap::new(),
            roots: Vec::new(),
            next_instance: 1,
            scheduler: Scheduler::default(),
            layout_effects: Vec::new(),
            mode,
            config,
            renderer,
            root_context: ContextMap::new(),
            frames: VecDeque::new(),
            last_hash: None,
            frame_seq: 0,
            commits: 0,
            started_at: Instant::now(),
        }
    }

    /// Render `view` once without a layout phase and return the markup.
    pub fn render_static(config: RuntimeConfig, view: impl Into<View>) -> Result<String> {
        let mut runtime = Self::with_mode(config, RenderMode::Static);
        runtime.render(view)?;
        let markup = runtime.markup();
        runtime.teardown();
        Ok(markup)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn frames(&self) -> &VecDeque<Frame> {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.back()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn markup(&self) -> String {
        self.renderer.document_markup(&self.document)
    }

    pub fn write_markup(&self, writer: &mut impl Write) -> Result<()> {
        self.renderer.render(writer, &self.document)
    }

    /// Registries owned by mounted providers, in tree order.
    pub fn registries(&self) -> Vec<SlotRegistry> {
        let mut found = Vec::new();
        let mut stack: Vec<InstanceId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(instance) = self.instances.get(&id) else {
                continue;
            };
            if let InstanceKind::Provider { registry } = &instance.kind {
                found.push(registry.clone());
            }
            stack.extend(instance.children.iter().rev());
        }
        found
    }

    /// Run one update cycle for `view`. On failure the whole tree is torn
    /// down before the error is returned.
    pub fn render(&mut self, view: impl Into<View>) -> Result<()> {
        let view = view.into();
        let result = self.commit(Some(view));
        self.finish_commit(result)
    }

    /// Process notifications that arrived outside a render.
    pub fn flush(&mut self) -> Result<()> {
        let result = self.commit(None);
        self.finish_commit(result)
    }

    /// Unmount everything and paint the empty document.
    pub fn unmount(&mut self) {
        self.teardown();
        self.paint();
    }

    fn commit(&mut self, view: Option<View>) -> Result<usize> {
        self.commits += 1;
        self.audit(CommitStage::CommitStarted, [("commit", json!(self.commits))]);

        if let Some(view) = view {
            let roots = std::mem::take(&mut self.roots);
            let context = self.root_context.clone();
            self.roots = self.reconcile_children(roots, vec![view], &context)?;
            let hosts = self.host_nodes(&self.roots);
            let root = self.document.root();
            self.document.arrange_leading(root, &hosts)?;
        }

        let passes = self.settle()?;
        self.paint();
        Ok(passes)
    }

    fn finish_commit(&mut self, result: Result<usize>) -> Result<()> {
        match result {
            Ok(passes) => {
                self.with_metrics(|metrics| metrics.record_commit(passes));
                self.log(
                    LogLevel::Debug,
                    "commit_completed",
                    [
                        json_kv("commit", json!(self.commits)),
                        json_kv("sync_passes", json!(passes)),
                        json_kv("instances", json!(self.instances.len())),
                    ],
                );
                self.maybe_emit_metrics();
                Ok(())
            }
            Err(err) => {
                self.log(
                    LogLevel::Error,
                    "commit_failed",
                    [
                        json_kv("commit", json!(self.commits)),
                        json_str("error", err.to_string()),
                    ],
                );
                self.teardown();
                self.paint();
                Err(err)
            }
        }
    }

    /// Layout effects and synchronization passes until nothing is queued.
    fn settle(&mut self) -> Result<usize> {
        let mut passes = 0;
        loop {
            self.run_layout_effects()?;
            let scheduled = self.scheduler.drain();
            if scheduled.is_empty() {
                return Ok(passes);
            }
            passes += 1;
            if passes > self.config.max_sync_passes {
                self.scheduler.clear();
                return Err(SlotError::SyncOverflow(self.config.max_sync_passes));
            }
            let portals = scheduled.len();
            for id in scheduled {
                self.sync_portal(id)?;
            }
            self.audit(
                CommitStage::SyncPass,
                [("pass", json!(passes)), ("portals", json!(portals))],
            );
        }
    }

    fn run_layout_effects(&mut self) -> Result<()> {
        while !self.layout_effects.is_empty() {
            let effects = std::mem::take(&mut self.layout_effects);
            for id in effects {
                self.register_slot(id)?;
            }
        }
        Ok(())
    }

    fn paint(&mut self) {
        let markup = self.markup();
        let hash = blake3::hash(markup.as_bytes());
        if self.last_hash == Some(hash) {
            self.with_metrics(|metrics| metrics.record_frame(false));
            self.audit(CommitStage::FrameSkipped, [("frame", json!(self.frame_seq))]);
            return;
        }

        self.last_hash = Some(hash);
        self.frame_seq += 1;
        let frame = Frame {
            seq: self.frame_seq,
            markup,
            hash,
        };
        self.with_metrics(|metrics| metrics.record_frame(true));
        self.audit(
            CommitStage::FramePainted,
            [
                ("frame", json!(frame.seq)),
                ("hash", json!(frame.hash_hex())),
            ],
        );
        if self.config.frame_history > 0 {
            self.frames.push_back(frame);
            while self.frames.len() > self.config.frame_history {
                self.frames.pop_front();
            }
        }
    }

    /// Unmount every instance, reachable or not, and drop queued work.
    fn teardown(&mut self) {
        self.layout_effects.clear();
        self.roots.clear();
        let mut ids: Vec<InstanceId> = self.instances.keys().copied().collect();
        ids.sort();
        for id in ids {
            self.unmount_instance(id);
        }
        self.scheduler.clear();
        self.audit(CommitStage::TreeTornDown, std::iter::empty());
    }

    fn next_instance_id(&mut self) -> InstanceId {
        let id = InstanceId::from_raw(self.next_instance);
        self.next_instance += 1;
        id
    }

    fn new_registry(&self) -> SlotRegistry {
        SlotRegistry::with_observability(self.config.logger.clone(), self.config.metrics_handle())
    }

    fn audit<I>(&self, stage: CommitStage, details: I)
    where
        I: IntoIterator<Item = (&'static str, serde_json::Value)>,
    {
        if let Some(audit) = self.config.audit.as_ref() {
            let mut builder = CommitAuditEventBuilder::new(stage);
            for (key, value) in details {
                builder.detail(key, value);
            }
            audit.record(builder.finish());
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            if logger.enabled(level) {
                let event = event_with_fields(level, RUNTIME_TARGET, message, fields);
                let _ = logger.log_event(event);
            }
        }
    }

    fn with_metrics(&self, record: impl FnOnce(&mut SlotMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }

    fn maybe_emit_metrics(&self) {
        if !self.config.emit_metrics {
            return;
        }
        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard
                    .snapshot(self.started_at.elapsed())
                    .to_log_event(METRICS_TARGET);
                let _ = logger.log_event(event);
            }
        }
    }
}
