use thiserror::Error;

/// Reasons a raw event could not be turned into an [`ExecutionEvent`](crate::ExecutionEvent).
#[derive(Debug, Error)]
pub enum EventError {
  #[error("event is not a JSON object")]
  NotAnObject,

  #[error("event has no type")]
  MissingType,

  #[error("event has no data")]
  MissingData,

  #[error("event data has no app_run_id")]
  MissingRunId,

  #[error("event data has no node_exec_data")]
  MissingNodeExecData,

  #[error("invalid node_exec_data: {0}")]
  InvalidNodeExecData(#[from] serde_json::Error),
}
