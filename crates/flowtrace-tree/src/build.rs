use std::collections::HashMap;

use flowtrace_event::ExecId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::node::{AnnotatedEvent, ExecutionNode};

/// What to do with a record whose `parent_exec_id` is not in the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
  /// Leave it out of this pass. It shows up once its parent arrives, since
  /// every batch rebuilds from the whole log.
  #[default]
  Drop,
  /// Show it at the top level until its parent arrives.
  Promote,
}

/// Nest a flat list of records under their `parent_exec_id`.
///
/// A record becomes a child of the first record in the list whose
/// `node_exec_id` equals its `parent_exec_id`, or a top-level node when it
/// has no parent. Sibling order follows list order. Records caught in a
/// parent cycle are never reachable from a top-level node and are left out.
pub fn build_forest(events: Vec<AnnotatedEvent>, orphans: OrphanPolicy) -> Vec<ExecutionNode> {
  let mut first_index: HashMap<ExecId, usize> = HashMap::new();
  for (idx, event) in events.iter().enumerate() {
    first_index
      .entry(event.data.node_exec_id.clone())
      .or_insert(idx);
  }

  let mut roots = Vec::new();
  let mut children: Vec<Vec<usize>> = vec![Vec::new(); events.len()];

  for (idx, event) in events.iter().enumerate() {
    let Some(parent_id) = &event.data.parent_exec_id else {
      roots.push(idx);
      continue;
    };

    match first_index.get(parent_id) {
      Some(&parent) if parent != idx => children[parent].push(idx),
      _ => match orphans {
        OrphanPolicy::Drop => {
          debug!(
            node_exec_id = %event.data.node_exec_id,
            parent_exec_id = %parent_id,
            "parent not in log, skipping record"
          );
        }
        OrphanPolicy::Promote => roots.push(idx),
      },
    }
  }

  let mut slots: Vec<Option<AnnotatedEvent>> = events.into_iter().map(Some).collect();
  let forest: Vec<ExecutionNode> = roots
    .into_iter()
    .filter_map(|idx| place(idx, &mut slots, &children))
    .collect();

  let unplaced = slots.iter().filter(|slot| slot.is_some()).count();
  if unplaced > 0 {
    debug!(unplaced, "records left out of the execution tree");
  }

  forest
}

fn place(
  idx: usize,
  slots: &mut [Option<AnnotatedEvent>],
  children: &[Vec<usize>],
) -> Option<ExecutionNode> {
  let mut node = ExecutionNode::from(slots[idx].take()?);
  node.children = children[idx]
    .iter()
    .filter_map(|&child| place(child, slots, children))
    .collect();
  Some(node)
}
