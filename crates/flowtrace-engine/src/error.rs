//! Error types for the trace runner.

use thiserror::Error;

/// Errors surfaced by [`TraceRunner`](crate::TraceRunner).
///
/// Reconciliation itself has no failure mode: bad input is dropped, never
/// reported.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The runner loop has stopped and no longer accepts messages.
  #[error("trace runner channel closed")]
  ChannelClosed,
}
