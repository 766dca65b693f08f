use std::collections::HashSet;

use flowtrace_event::ExecId;

use crate::node::ExecutionNode;

struct Slot {
  keys: HashSet<ExecId>,
  node: ExecutionNode,
  absorbed: bool,
}

impl Slot {
  fn new(node: ExecutionNode) -> Self {
    Self {
      keys: node.identity_keys().cloned().collect(),
      node,
      absorbed: false,
    }
  }

  /// Take over a later slot's payload while keeping this slot's id and position.
  fn absorb(&mut self, later: Slot) {
    self.keys.extend(later.keys);
    self.node.payload = later.node.payload;
    self.node.human = later.node.human;
    self.node.children.extend(later.node.children);
    self.absorbed = true;
  }
}

/// Collapse retry chains within one level of the forest, recursively.
///
/// Two nodes belong to the same chain when one's `node_exec_id` appears as
/// the other's `node_exec_id` or `first_task_exec_id`, transitively. Each
/// chain keeps the slot of its earliest node; the payload of its latest node
/// wins. Children of merged nodes are concatenated in list order and merged
/// again. Running this on its own output is a no-op.
pub fn merge_level(nodes: Vec<ExecutionNode>) -> Vec<ExecutionNode> {
  let mut slots: Vec<Slot> = Vec::with_capacity(nodes.len());

  for mut node in nodes {
    node.children = merge_level(std::mem::take(&mut node.children));
    let slot = Slot::new(node);

    let matching: Vec<usize> = slots
      .iter()
      .enumerate()
      .filter(|(_, existing)| !existing.keys.is_disjoint(&slot.keys))
      .map(|(idx, _)| idx)
      .collect();

    let Some((&target, bridged)) = matching.split_first() else {
      slots.push(slot);
      continue;
    };

    // A node can link two chains that were separate until now; fold the
    // later ones into the earliest slot in list order.
    let mut folded: Vec<Slot> = bridged.iter().rev().map(|&idx| slots.remove(idx)).collect();
    folded.reverse();
    for earlier in folded {
      slots[target].absorb(earlier);
    }
    slots[target].absorb(slot);
  }

  slots
    .into_iter()
    .map(|slot| {
      let mut node = slot.node;
      if slot.absorbed {
        node.children = merge_level(node.children);
      }
      node
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowtrace_event::{NodeExecData, NodeStatus};

  fn node(id: i64, first: Option<i64>, status: NodeStatus) -> ExecutionNode {
    let mut data = NodeExecData::new(id, status);
    data.first_task_exec_id = first.map(ExecId::from);
    ExecutionNode::new(data, false)
  }

  fn with_children(mut parent: ExecutionNode, children: Vec<ExecutionNode>) -> ExecutionNode {
    parent.children = children;
    parent
  }

  fn ids(nodes: &[ExecutionNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.id.as_str()).collect()
  }

  #[test]
  fn test_retry_collapses_into_first_slot() {
    let merged = merge_level(vec![
      node(1, None, NodeStatus::RUNNING),
      node(2, Some(1), NodeStatus::SUCCESS),
    ]);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].id.as_str(), "1");
    assert_eq!(merged[0].payload.node_exec_id.as_str(), "2");
    assert_eq!(merged[0].payload.status, NodeStatus::SUCCESS);
  }

  #[test]
  fn test_retry_does_not_reorder_siblings() {
    let merged = merge_level(vec![
      node(1, None, NodeStatus::RUNNING),
      node(5, None, NodeStatus::RUNNING),
      node(2, Some(1), NodeStatus::SUCCESS),
      node(6, None, NodeStatus::RUNNING),
    ]);

    assert_eq!(ids(&merged), vec!["1", "5", "6"]);
    assert_eq!(merged[0].payload.status, NodeStatus::SUCCESS);
  }

  #[test]
  fn test_successor_before_original() {
    let merged = merge_level(vec![
      node(2, Some(1), NodeStatus::SUCCESS),
      node(1, None, NodeStatus::RUNNING),
    ]);

    assert_eq!(ids(&merged), vec!["2"]);
    assert_eq!(merged[0].payload.node_exec_id.as_str(), "1");
  }

  #[test]
  fn test_self_reference_never_merges() {
    let merged = merge_level(vec![
      node(1, Some(1), NodeStatus::RUNNING),
      node(3, Some(3), NodeStatus::RUNNING),
    ]);
    assert_eq!(ids(&merged), vec!["1", "3"]);
  }

  #[test]
  fn test_same_id_updates_in_place() {
    let merged = merge_level(vec![
      node(1, None, NodeStatus::RUNNING),
      node(1, None, NodeStatus::FAILED),
    ]);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].payload.status, NodeStatus::FAILED);
  }

  #[test]
  fn test_chain_sharing_first_task_collapses() {
    let merged = merge_level(vec![
      node(1, None, NodeStatus::FAILED),
      node(2, Some(1), NodeStatus::FAILED),
      node(3, Some(1), NodeStatus::SUCCESS),
    ]);

    assert_eq!(ids(&merged), vec!["1"]);
    assert_eq!(merged[0].payload.node_exec_id.as_str(), "3");
  }

  #[test]
  fn test_bridging_node_joins_two_slots() {
    let merged = merge_level(vec![
      node(1, None, NodeStatus::RUNNING),
      node(9, None, NodeStatus::RUNNING),
      node(3, None, NodeStatus::RUNNING),
      node(1, Some(3), NodeStatus::SUCCESS),
    ]);

    assert_eq!(ids(&merged), vec!["1", "9"]);
    assert_eq!(merged[0].payload.status, NodeStatus::SUCCESS);
  }

  #[test]
  fn test_retried_parent_keeps_subtree() {
    let merged = merge_level(vec![
      with_children(
        node(1, None, NodeStatus::FAILED),
        vec![node(10, None, NodeStatus::FAILED)],
      ),
      with_children(
        node(2, Some(1), NodeStatus::SUCCESS),
        vec![
          node(11, Some(10), NodeStatus::SUCCESS),
          node(12, None, NodeStatus::SUCCESS),
        ],
      ),
    ]);

    assert_eq!(ids(&merged), vec!["1"]);
    assert_eq!(ids(&merged[0].children), vec!["10", "12"]);
    assert_eq!(merged[0].children[0].payload.status, NodeStatus::SUCCESS);
  }

  #[test]
  fn test_merge_is_idempotent() {
    let level = vec![
      node(1, None, NodeStatus::RUNNING),
      node(4, None, NodeStatus::RUNNING),
      node(2, Some(1), NodeStatus::FAILED),
      node(3, Some(2), NodeStatus::SUCCESS),
      node(5, Some(4), NodeStatus::SUCCESS),
    ];

    let once = merge_level(level);
    let twice = merge_level(once.clone());
    assert_eq!(once, twice);
  }
}
