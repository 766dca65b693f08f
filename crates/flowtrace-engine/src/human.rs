use std::collections::HashSet;

use flowtrace_event::{EventKind, ExecId, ExecutionEvent, RunId};
use flowtrace_tree::ExecutionNode;
use tracing::debug;

/// Every node, at any depth, that is waiting for a human confirmation.
pub fn collect_backlog(forest: &[ExecutionNode]) -> Vec<ExecutionNode> {
  forest
    .iter()
    .flat_map(ExecutionNode::walk)
    .filter(|node| node.human)
    .cloned()
    .collect()
}

/// Remove the `need_human_confirm` events of `run_id` that target `id`.
///
/// When `id` names a node in `forest`, confirmations aimed at any record of
/// that node's retry chain are removed too. Returns how many events were
/// removed; zero is not an error.
pub fn resolve_confirmations(
  log: &mut Vec<ExecutionEvent>,
  run_id: &RunId,
  forest: &[ExecutionNode],
  id: &ExecId,
) -> usize {
  let targets: HashSet<&ExecId> = forest
    .iter()
    .flat_map(ExecutionNode::walk)
    .find(|node| node.answers_to(id))
    .map(|node| node.identity_keys().collect())
    .unwrap_or_else(|| HashSet::from([id]));

  let before = log.len();
  log.retain(|event| {
    !(event.kind == EventKind::NeedHumanConfirm
      && event.run_id == *run_id
      && targets.contains(event.exec_id()))
  });

  let removed = before - log.len();
  debug!(node_exec_id = %id, removed, "resolved human confirmation");
  removed
}
