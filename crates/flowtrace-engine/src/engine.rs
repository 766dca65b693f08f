//! Query facade over the accumulated event log of one run.

use flowtrace_event::{ExecId, ExecutionEvent, RunId};
use flowtrace_tree::ExecutionNode;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::TraceConfig;
use crate::human::resolve_confirmations;
use crate::normalize::parse_batch;
use crate::reconcile::{Snapshot, reconcile};

/// Holds the event log of the observed run and the tree derived from it.
///
/// The log is append-only apart from [`resolve`](Self::resolve). Every
/// mutation recomputes the snapshot from the whole log, so the read side is
/// always a pure function of what was ingested.
#[derive(Debug, Default)]
pub struct TraceEngine {
  config: TraceConfig,
  run_id: Option<RunId>,
  log: Vec<ExecutionEvent>,
  snapshot: Snapshot,
}

impl TraceEngine {
  pub fn new(config: TraceConfig) -> Self {
    Self {
      config,
      ..Default::default()
    }
  }

  /// Create an engine already observing `run_id`.
  pub fn for_run(config: TraceConfig, run_id: RunId) -> Self {
    let mut engine = Self::new(config);
    engine.observe(run_id);
    engine
  }

  pub fn config(&self) -> &TraceConfig {
    &self.config
  }

  pub fn run_id(&self) -> Option<&RunId> {
    self.run_id.as_ref()
  }

  /// Switch to another run. The log is discarded when the run changes.
  ///
  /// Returns `true` if the observed run changed.
  pub fn observe(&mut self, run_id: RunId) -> bool {
    if self.run_id.as_ref() == Some(&run_id) {
      return false;
    }

    info!(
      run_id = %run_id,
      discarded = self.log.len(),
      "observing run"
    );
    self.run_id = Some(run_id);
    self.log.clear();
    self.refresh();
    true
  }

  /// Forget the observed run and its log.
  pub fn reset(&mut self) {
    self.run_id = None;
    self.log.clear();
    self.snapshot = Snapshot::default();
  }

  /// Append a batch of raw messages. Malformed messages are dropped.
  ///
  /// Returns the number of events appended.
  pub fn ingest(&mut self, batch: impl IntoIterator<Item = Value>) -> usize {
    self.ingest_events(parse_batch(batch))
  }

  /// Append already-parsed events.
  pub fn ingest_events(&mut self, events: impl IntoIterator<Item = ExecutionEvent>) -> usize {
    let before = self.log.len();
    self.log.extend(events);
    let appended = self.log.len() - before;

    debug!(appended, total = self.log.len(), "ingested events");
    self.refresh();
    appended
  }

  /// Current top-level forest.
  pub fn tree(&self) -> &[ExecutionNode] {
    &self.snapshot.tree
  }

  /// Node for the "Result" view.
  pub fn end_node(&self) -> Option<&ExecutionNode> {
    self.snapshot.end_node.as_ref()
  }

  /// Nodes at any depth waiting for human confirmation.
  pub fn backlog(&self) -> &[ExecutionNode] {
    &self.snapshot.backlog
  }

  pub fn backlog_count(&self) -> usize {
    self.snapshot.backlog.len()
  }

  pub fn snapshot(&self) -> &Snapshot {
    &self.snapshot
  }

  /// The accumulated log, in append order.
  pub fn events(&self) -> &[ExecutionEvent] {
    &self.log
  }

  /// Mark the confirmation for `id` as handled.
  ///
  /// Returns how many `need_human_confirm` events were removed; resolving an
  /// id with nothing pending is a no-op.
  pub fn resolve(&mut self, id: &ExecId) -> usize {
    let Some(run_id) = &self.run_id else {
      return 0;
    };

    let removed = resolve_confirmations(&mut self.log, run_id, &self.snapshot.tree, id);
    if removed > 0 {
      self.refresh();
    }
    removed
  }

  fn refresh(&mut self) {
    self.snapshot = match &self.run_id {
      Some(run_id) => reconcile(&self.log, run_id, &self.config),
      None => Snapshot::default(),
    };
  }
}
