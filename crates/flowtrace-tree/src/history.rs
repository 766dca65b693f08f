use flowtrace_event::HistoryRecord;

use crate::merge::merge_level;
use crate::node::ExecutionNode;

/// Build an execution tree from a pre-nested historical log.
///
/// The workflow service already nests `child_executions`, so only retry
/// merging is applied. Historical records never carry a pending confirmation.
pub fn from_history(records: Vec<HistoryRecord>) -> Vec<ExecutionNode> {
  merge_level(records.into_iter().map(convert).collect())
}

fn convert(record: HistoryRecord) -> ExecutionNode {
  let mut node = ExecutionNode::new(record.data, false);
  node.children = record.child_executions.into_iter().map(convert).collect();
  node
}
