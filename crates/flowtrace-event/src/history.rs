use serde::{Deserialize, Serialize};

use crate::event::NodeExecData;

/// A historical log entry from the workflow service.
///
/// The service nests sub-executions itself (`child_executions`), unlike the
/// live stream where nesting is rebuilt from `parent_exec_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub child_executions: Vec<HistoryRecord>,
  #[serde(flatten)]
  pub data: NodeExecData,
}
