use flowtrace_event::{ExecutionEvent, RunId};
use flowtrace_tree::{ExecutionNode, build_forest, merge_level};
use serde::{Deserialize, Serialize};

use crate::config::TraceConfig;
use crate::end::find_end_node;
use crate::human::collect_backlog;
use crate::normalize::normalize;

/// Everything the presentation layer reads for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
  pub run_id: Option<RunId>,
  pub tree: Vec<ExecutionNode>,
  pub end_node: Option<ExecutionNode>,
  pub backlog: Vec<ExecutionNode>,
}

/// Fold an event log into the execution tree of `run_id`.
///
/// Pure: the same log and run always give the same snapshot.
pub fn reconcile(log: &[ExecutionEvent], run_id: &RunId, config: &TraceConfig) -> Snapshot {
  let normalized = normalize(log, run_id);
  let tree = merge_level(build_forest(normalized.executions, config.orphans));
  let end_node = find_end_node(&tree, &config.status).cloned();
  let backlog = collect_backlog(&tree);

  Snapshot {
    run_id: Some(run_id.clone()),
    tree,
    end_node,
    backlog,
  }
}
