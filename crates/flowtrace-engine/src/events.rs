//! Trace updates and notifiers for the presentation layer.
//!
//! The runner publishes an update after every message it handles so that
//! run panels, log panels, or a terminal printer can re-render.

use flowtrace_event::{ExecId, RunId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::reconcile::Snapshot;

/// Updates emitted by the trace runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TraceUpdate {
  /// The observed run changed and the log was discarded.
  RunObserved { run_id: RunId },

  /// The tree was recomputed after a batch.
  Reconciled { snapshot: Snapshot },

  /// A human confirmation was resolved.
  Resolved {
    node_exec_id: ExecId,
    removed: usize,
    snapshot: Snapshot,
  },
}

/// Trait for receiving trace updates.
pub trait TraceNotifier: Send + Sync {
  fn notify(&self, update: TraceUpdate);
}

/// A notifier that discards all updates.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl TraceNotifier for NoopNotifier {
  fn notify(&self, _update: TraceUpdate) {}
}

/// A notifier that sends updates to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow renderer never stalls the runner loop. One update is
  // produced per incoming message.
  sender: mpsc::UnboundedSender<TraceUpdate>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<TraceUpdate>) -> Self {
    Self { sender }
  }
}

impl TraceNotifier for ChannelNotifier {
  fn notify(&self, update: TraceUpdate) {
    // Receiver may have been dropped
    let _ = self.sender.send(update);
  }
}
