use chrono::{DateTime, Utc};
use flowtrace_event::ExecutionEvent;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// An execution event as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StoredEvent {
  pub seq: i64,
  pub run_id: String,
  pub event: Json<ExecutionEvent>,
  pub received_at: DateTime<Utc>,
}

impl StoredEvent {
  pub fn into_event(self) -> ExecutionEvent {
    self.event.0
  }
}

/// Per-run overview of the stored log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RunSummary {
  pub run_id: String,
  pub events: i64,
  pub last_received_at: DateTime<Utc>,
}
