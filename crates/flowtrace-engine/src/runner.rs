//! Trace runner with channel-based event delivery.
//!
//! The `TraceRunner` owns an mpsc channel fed by the execution event source
//! and applies every message to a single `TraceEngine`.

use std::sync::Arc;

use flowtrace_event::{ExecId, RunId};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::TraceConfig;
use crate::engine::TraceEngine;
use crate::error::EngineError;
use crate::events::{TraceNotifier, TraceUpdate};

/// Messages accepted by the runner.
#[derive(Debug, Clone)]
pub enum SourceMessage {
  /// Raw events from the push channel.
  Batch(Vec<Value>),
  /// The panel switched to another run.
  Observe(RunId),
  /// A human confirmation was handled.
  Resolve(ExecId),
}

/// Drives a [`TraceEngine`] from a channel.
///
/// The engine is only touched from the runner loop, so updates are applied
/// one message at a time in arrival order.
///
/// # Usage
///
/// ```ignore
/// let runner = TraceRunner::new(TraceConfig::default(), Arc::new(notifier));
///
/// // Hand the sender to the push channel adapter
/// let sender = runner.sender();
///
/// let cancel = CancellationToken::new();
/// let engine = runner.start(cancel).await;
/// ```
pub struct TraceRunner {
  sender: mpsc::Sender<SourceMessage>,
  receiver: mpsc::Receiver<SourceMessage>,
  engine: TraceEngine,
  notifier: Arc<dyn TraceNotifier>,
}

impl TraceRunner {
  pub fn new(config: TraceConfig, notifier: Arc<dyn TraceNotifier>) -> Self {
    Self::with_buffer_size(config, notifier, 100)
  }

  pub fn with_buffer_size(
    config: TraceConfig,
    notifier: Arc<dyn TraceNotifier>,
    buffer_size: usize,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      sender,
      receiver,
      engine: TraceEngine::new(config),
      notifier,
    }
  }

  /// Get a sender handle for the event source.
  pub fn sender(&self) -> mpsc::Sender<SourceMessage> {
    self.sender.clone()
  }

  /// Send a message through the runner's own channel.
  pub async fn send(&self, message: SourceMessage) -> Result<(), EngineError> {
    self
      .sender
      .send(message)
      .await
      .map_err(|_| EngineError::ChannelClosed)
  }

  pub fn engine(&self) -> &TraceEngine {
    &self.engine
  }

  /// Apply one message to the engine and notify.
  pub fn handle(&mut self, message: SourceMessage) {
    match message {
      SourceMessage::Batch(batch) => {
        let received = batch.len();
        let appended = self.engine.ingest(batch);
        debug!(received, appended, "batch applied");
        self.notifier.notify(TraceUpdate::Reconciled {
          snapshot: self.engine.snapshot().clone(),
        });
      }
      SourceMessage::Observe(run_id) => {
        if self.engine.observe(run_id.clone()) {
          self.notifier.notify(TraceUpdate::RunObserved { run_id });
        }
      }
      SourceMessage::Resolve(node_exec_id) => {
        let removed = self.engine.resolve(&node_exec_id);
        self.notifier.notify(TraceUpdate::Resolved {
          node_exec_id,
          removed,
          snapshot: self.engine.snapshot().clone(),
        });
      }
    }
  }

  /// Start the runner loop.
  ///
  /// Runs until the cancellation token fires or every sender is dropped,
  /// then hands back the engine with its final state.
  pub async fn start(mut self, cancel: CancellationToken) -> TraceEngine {
    info!("starting trace runner");

    // Drop our own sender so the loop ends once external senders are gone.
    let (closed, _) = mpsc::channel(1);
    drop(std::mem::replace(&mut self.sender, closed));

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("trace runner cancelled");
          break;
        }
        message = self.receiver.recv() => {
          match message {
            Some(message) => self.handle(message),
            None => {
              info!("trace runner channel closed");
              break;
            }
          }
        }
      }
    }

    self.engine
  }
}
