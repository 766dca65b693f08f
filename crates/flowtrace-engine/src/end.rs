use flowtrace_tree::ExecutionNode;

use crate::config::{StatusClass, StatusCodes};

/// The node that feeds the "Result" view, if the run has produced one.
///
/// Only top-level nodes are considered. Nothing is returned until at least
/// one of them succeeded; after that the last finished node in list order
/// wins, so a stale terminal record from before a retry is never shown.
pub fn find_end_node<'a>(
  forest: &'a [ExecutionNode],
  codes: &StatusCodes,
) -> Option<&'a ExecutionNode> {
  let succeeded = forest
    .iter()
    .any(|node| codes.classify(node.payload.status) == StatusClass::Success);
  if !succeeded {
    return None;
  }

  forest
    .iter()
    .rev()
    .find(|node| codes.classify(node.payload.status).is_terminal())
}
