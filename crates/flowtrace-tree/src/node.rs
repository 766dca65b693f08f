use flowtrace_event::{ExecId, NodeExecData};
use serde::{Deserialize, Serialize};

/// A `run_debug` payload after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedEvent {
  pub data: NodeExecData,
  /// An outstanding `need_human_confirm` event targets this record.
  pub human: bool,
}

impl AnnotatedEvent {
  pub fn new(data: NodeExecData, human: bool) -> Self {
    Self { data, human }
  }
}

/// One row of the rendered execution tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionNode {
  /// Id of the first record that occupied this slot. Stays fixed when later
  /// retries overwrite the payload.
  pub id: ExecId,
  /// Latest record seen for this identity.
  pub payload: NodeExecData,
  pub human: bool,
  #[serde(default)]
  pub children: Vec<ExecutionNode>,
}

impl ExecutionNode {
  pub fn new(payload: NodeExecData, human: bool) -> Self {
    Self {
      id: payload.node_exec_id.clone(),
      payload,
      human,
      children: Vec::new(),
    }
  }

  /// Ids that tie this node to a retry chain.
  pub fn identity_keys(&self) -> impl Iterator<Item = &ExecId> {
    std::iter::once(&self.id)
      .chain(std::iter::once(&self.payload.node_exec_id))
      .chain(self.payload.supersedes())
  }

  /// Whether `id` names this node or any record merged into its slot.
  pub fn answers_to(&self, id: &ExecId) -> bool {
    self.identity_keys().any(|key| key == id)
  }

  /// Pre-order walk over this node and all of its descendants.
  pub fn walk(&self) -> Walk<'_> {
    Walk { stack: vec![self] }
  }

  /// Find a node at any depth by one of its identity keys.
  pub fn find(&self, id: &ExecId) -> Option<&ExecutionNode> {
    self.walk().find(|node| node.answers_to(id))
  }
}

impl From<AnnotatedEvent> for ExecutionNode {
  fn from(event: AnnotatedEvent) -> Self {
    ExecutionNode::new(event.data, event.human)
  }
}

/// Depth-first iterator returned by [`ExecutionNode::walk`].
pub struct Walk<'a> {
  stack: Vec<&'a ExecutionNode>,
}

impl<'a> Iterator for Walk<'a> {
  type Item = &'a ExecutionNode;

  fn next(&mut self) -> Option<Self::Item> {
    let node = self.stack.pop()?;
    self.stack.extend(node.children.iter().rev());
    Some(node)
  }
}
