use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use flowtrace_event::{EventKind, ExecId, ExecutionEvent, RunId};
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use tracing::{debug, instrument};

use crate::{EventStore, RunSummary, StoreError, StoredEvent};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if needed) a database file and apply migrations.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true);
    let store = Self::new(SqlitePool::connect_with(options).await?);
    store.migrate().await?;
    Ok(store)
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), StoreError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl EventStore for SqliteStore {
  #[instrument(skip_all, fields(count = events.len()))]
  async fn append_events(&self, events: &[ExecutionEvent]) -> Result<u64, StoreError> {
    let received_at = Utc::now();
    let mut tx = self.pool.begin().await?;

    for event in events {
      sqlx::query(
        r#"
        INSERT INTO trace_events (run_id, kind, node_exec_id, event, received_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
      )
      .bind(event.run_id.as_str())
      .bind(event.kind.as_str())
      .bind(event.exec_id().as_str())
      .bind(serde_json::to_string(event)?)
      .bind(received_at)
      .execute(&mut *tx)
      .await?;
    }

    tx.commit().await?;
    debug!("events appended");
    Ok(events.len() as u64)
  }

  async fn list_events(&self, run_id: &RunId) -> Result<Vec<StoredEvent>, StoreError> {
    let events = sqlx::query_as(
      r#"
      SELECT seq, run_id, event, received_at
      FROM trace_events
      WHERE run_id = ?
      ORDER BY seq ASC
      "#,
    )
    .bind(run_id.as_str())
    .fetch_all(&self.pool)
    .await?;

    Ok(events)
  }

  async fn list_runs(&self) -> Result<Vec<RunSummary>, StoreError> {
    let runs = sqlx::query_as(
      r#"
      SELECT run_id, COUNT(*) AS events, MAX(received_at) AS last_received_at
      FROM trace_events
      GROUP BY run_id
      ORDER BY MAX(seq) DESC
      "#,
    )
    .fetch_all(&self.pool)
    .await?;

    Ok(runs)
  }

  #[instrument(skip_all, fields(run_id = %run_id))]
  async fn delete_run(&self, run_id: &RunId) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM trace_events WHERE run_id = ?")
      .bind(run_id.as_str())
      .execute(&self.pool)
      .await?;

    Ok(result.rows_affected())
  }

  #[instrument(skip_all, fields(run_id = %run_id, count = exec_ids.len()))]
  async fn delete_confirmations(
    &self,
    run_id: &RunId,
    exec_ids: &[ExecId],
  ) -> Result<u64, StoreError> {
    let mut tx = self.pool.begin().await?;
    let mut removed = 0;

    for exec_id in exec_ids {
      let result = sqlx::query(
        r#"
        DELETE FROM trace_events
        WHERE run_id = ? AND kind = ? AND node_exec_id = ?
        "#,
      )
      .bind(run_id.as_str())
      .bind(EventKind::NeedHumanConfirm.as_str())
      .bind(exec_id.as_str())
      .execute(&mut *tx)
      .await?;
      removed += result.rows_affected();
    }

    tx.commit().await?;
    Ok(removed)
  }
}
