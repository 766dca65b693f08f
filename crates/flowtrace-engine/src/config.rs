use flowtrace_event::NodeStatus;
use flowtrace_tree::OrphanPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for reconciliation.
///
/// Loaded from JSON; every field has a default so `{}` is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
  pub status: StatusCodes,
  pub orphans: OrphanPolicy,
}

/// Which status codes the workflow service uses for finished executions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCodes {
  pub success: Vec<i64>,
  pub fail: Vec<i64>,
}

impl Default for StatusCodes {
  fn default() -> Self {
    Self {
      success: vec![NodeStatus::SUCCESS.code()],
      fail: vec![NodeStatus::FAILED.code()],
    }
  }
}

/// Coarse classification of a [`NodeStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
  InFlight,
  Success,
  Failed,
}

impl StatusClass {
  pub fn is_terminal(self) -> bool {
    !matches!(self, StatusClass::InFlight)
  }
}

impl StatusCodes {
  pub fn classify(&self, status: NodeStatus) -> StatusClass {
    if self.success.contains(&status.code()) {
      StatusClass::Success
    } else if self.fail.contains(&status.code()) {
      StatusClass::Failed
    } else {
      StatusClass::InFlight
    }
  }
}
