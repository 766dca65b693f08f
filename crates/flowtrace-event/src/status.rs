use serde::{Deserialize, Deserializer, Serialize};

/// Raw status code of a node execution.
///
/// Codes are defined by the workflow service. The conventional values are
/// pending (0), running (1), success (2) and fail (3); which codes count as
/// terminal is decided by the engine configuration, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct NodeStatus(pub i64);

impl NodeStatus {
  pub const PENDING: NodeStatus = NodeStatus(0);
  pub const RUNNING: NodeStatus = NodeStatus(1);
  pub const SUCCESS: NodeStatus = NodeStatus(2);
  pub const FAILED: NodeStatus = NodeStatus(3);

  pub fn code(self) -> i64 {
    self.0
  }
}

impl From<i64> for NodeStatus {
  fn from(code: i64) -> Self {
    Self(code)
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatus {
  Code(i64),
  Text(String),
}

// Some producers quote the status code ("2").
impl<'de> Deserialize<'de> for NodeStatus {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    match RawStatus::deserialize(deserializer)? {
      RawStatus::Code(code) => Ok(Self(code)),
      RawStatus::Text(text) => text
        .trim()
        .parse()
        .map(Self)
        .map_err(|_| serde::de::Error::custom(format!("invalid status code: {text:?}"))),
    }
  }
}
