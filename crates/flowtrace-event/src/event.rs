use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EventError;
use crate::id::{ExecId, RunId, deserialize_optional_id};
use crate::status::NodeStatus;

/// The `type` of an event on the push channel.
///
/// Only `run_debug` and `need_human_confirm` affect the execution tree; every
/// other type is carried as [`EventKind::Other`] and ignored downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
  RunDebug,
  NeedHumanConfirm,
  Other(String),
}

impl EventKind {
  pub fn as_str(&self) -> &str {
    match self {
      EventKind::RunDebug => "run_debug",
      EventKind::NeedHumanConfirm => "need_human_confirm",
      EventKind::Other(other) => other,
    }
  }
}

impl From<&str> for EventKind {
  fn from(s: &str) -> Self {
    match s {
      "run_debug" => EventKind::RunDebug,
      "need_human_confirm" => EventKind::NeedHumanConfirm,
      other => EventKind::Other(other.to_string()),
    }
  }
}

impl fmt::Display for EventKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for EventKind {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for EventKind {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Ok(EventKind::from(s.as_str()))
  }
}

/// Per-node run state carried by an event (`data.node_exec_data`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExecData {
  pub node_exec_id: ExecId,
  /// Execution that spawned this one. Absent means top level.
  #[serde(
    default,
    deserialize_with = "deserialize_optional_id",
    skip_serializing_if = "Option::is_none"
  )]
  pub parent_exec_id: Option<ExecId>,
  /// Earlier execution record this one supersedes (retry or correction).
  #[serde(
    default,
    deserialize_with = "deserialize_optional_id",
    skip_serializing_if = "Option::is_none"
  )]
  pub first_task_exec_id: Option<ExecId>,
  #[serde(default)]
  pub status: NodeStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_type: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub node_name: Option<Value>,
  #[serde(default, skip_serializing_if = "Value::is_null")]
  pub inputs: Value,
  #[serde(default, skip_serializing_if = "Value::is_null")]
  pub outputs: Value,
  /// Pass-through fields (elapsed time, token counts, ...).
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl NodeExecData {
  /// Minimal payload with only an id and a status.
  pub fn new(node_exec_id: impl Into<ExecId>, status: NodeStatus) -> Self {
    Self {
      node_exec_id: node_exec_id.into(),
      parent_exec_id: None,
      first_task_exec_id: None,
      status,
      node_type: None,
      node_name: None,
      inputs: Value::Null,
      outputs: Value::Null,
      extra: Map::new(),
    }
  }

  /// The record this one supersedes, ignoring a self-reference.
  pub fn supersedes(&self) -> Option<&ExecId> {
    self
      .first_task_exec_id
      .as_ref()
      .filter(|first| **first != self.node_exec_id)
  }
}

/// One message from the execution event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireEvent", from = "WireEvent")]
pub struct ExecutionEvent {
  pub kind: EventKind,
  pub run_id: RunId,
  pub data: NodeExecData,
}

impl ExecutionEvent {
  pub fn new(kind: EventKind, run_id: impl Into<RunId>, data: NodeExecData) -> Self {
    Self {
      kind,
      run_id: run_id.into(),
      data,
    }
  }

  pub fn exec_id(&self) -> &ExecId {
    &self.data.node_exec_id
  }
}

#[derive(Clone, Serialize, Deserialize)]
struct WireEvent {
  #[serde(rename = "type")]
  kind: EventKind,
  data: WireData,
}

#[derive(Clone, Serialize, Deserialize)]
struct WireData {
  app_run_id: RunId,
  node_exec_data: NodeExecData,
}

impl From<ExecutionEvent> for WireEvent {
  fn from(event: ExecutionEvent) -> Self {
    WireEvent {
      kind: event.kind,
      data: WireData {
        app_run_id: event.run_id,
        node_exec_data: event.data,
      },
    }
  }
}

impl From<WireEvent> for ExecutionEvent {
  fn from(wire: WireEvent) -> Self {
    ExecutionEvent {
      kind: wire.kind,
      run_id: wire.data.app_run_id,
      data: wire.data.node_exec_data,
    }
  }
}

/// Parse one raw message from the push channel.
///
/// Unlike plain deserialization this reports which part of the message is
/// missing, so callers can log why an event was dropped.
pub fn parse_event(raw: &Value) -> Result<ExecutionEvent, EventError> {
  let obj = raw.as_object().ok_or(EventError::NotAnObject)?;

  let kind = obj
    .get("type")
    .and_then(Value::as_str)
    .map(EventKind::from)
    .ok_or(EventError::MissingType)?;

  let data = obj
    .get("data")
    .and_then(Value::as_object)
    .ok_or(EventError::MissingData)?;

  let run_id = data
    .get("app_run_id")
    .filter(|v| !v.is_null())
    .ok_or(EventError::MissingRunId)?;
  let run_id = RunId::deserialize(run_id).map_err(|_| EventError::MissingRunId)?;

  let node = data
    .get("node_exec_data")
    .filter(|v| v.is_object())
    .ok_or(EventError::MissingNodeExecData)?;
  let node = NodeExecData::deserialize(node)?;

  Ok(ExecutionEvent {
    kind,
    run_id,
    data: node,
  })
}
