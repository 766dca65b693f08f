//! Flowtrace Store
//!
//! This crate provides the storage trait and a SQLite implementation for
//! execution event logs. A stored log can be replayed through the engine to
//! rebuild the tree of a run after the panel was closed.
//!
//! The [`EventStore`] trait defines operations for:
//! - Appending events in arrival order
//! - Listing the events of a run, and the runs that have events
//! - Removing resolved human confirmations and whole runs

mod sqlite;
mod types;

pub use sqlite::SqliteStore;
pub use types::{RunSummary, StoredEvent};

use async_trait::async_trait;
use flowtrace_event::{ExecId, ExecutionEvent, RunId};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Applying migrations failed.
  #[error("migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  /// An event could not be encoded for storage.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Storage trait for execution event logs.
#[async_trait]
pub trait EventStore: Send + Sync {
  /// Append events, each under its own `app_run_id`. Returns the count stored.
  async fn append_events(&self, events: &[ExecutionEvent]) -> Result<u64, StoreError>;

  /// List the events of a run in append order.
  async fn list_events(&self, run_id: &RunId) -> Result<Vec<StoredEvent>, StoreError>;

  /// List runs that have stored events, most recent first.
  async fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError>;

  /// Delete every event of a run. Returns the count removed.
  async fn delete_run(&self, run_id: &RunId) -> Result<u64, StoreError>;

  /// Delete `need_human_confirm` events of a run that target any of `exec_ids`.
  async fn delete_confirmations(
    &self,
    run_id: &RunId,
    exec_ids: &[ExecId],
  ) -> Result<u64, StoreError>;
}
