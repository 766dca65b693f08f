use std::collections::{HashMap, HashSet};

use flowtrace_event::{EventKind, ExecId, ExecutionEvent, RunId, parse_event};
use flowtrace_tree::AnnotatedEvent;
use serde_json::Value;
use tracing::debug;

/// Events of one run, split by what they do to the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
  /// Targets of outstanding `need_human_confirm` events.
  pub confirmations: Vec<ExecId>,
  /// `run_debug` payloads in log order, flagged when a confirmation targets them.
  pub executions: Vec<AnnotatedEvent>,
}

/// Parse raw messages from the push channel, dropping malformed ones.
pub fn parse_batch(batch: impl IntoIterator<Item = Value>) -> Vec<ExecutionEvent> {
  batch
    .into_iter()
    .filter_map(|raw| match parse_event(&raw) {
      Ok(event) => Some(event),
      Err(e) => {
        debug!(error = %e, "dropping malformed event");
        None
      }
    })
    .collect()
}

/// Select the events of `run_id` that affect the tree.
///
/// Exact re-deliveries of an earlier event are skipped so that replaying an
/// event never changes which payload wins a merge.
pub fn normalize(log: &[ExecutionEvent], run_id: &RunId) -> Normalized {
  let mut seen: HashMap<(&EventKind, &ExecId), Vec<&ExecutionEvent>> = HashMap::new();
  let mut confirmations = Vec::new();
  let mut executions = Vec::new();

  for event in log.iter().filter(|e| e.run_id == *run_id) {
    if !matches!(event.kind, EventKind::RunDebug | EventKind::NeedHumanConfirm) {
      continue;
    }

    let earlier = seen.entry((&event.kind, event.exec_id())).or_default();
    if earlier.iter().any(|e| *e == event) {
      continue;
    }
    earlier.push(event);

    match event.kind {
      EventKind::NeedHumanConfirm => confirmations.push(event.exec_id().clone()),
      _ => executions.push(&event.data),
    }
  }

  let pending: HashSet<&ExecId> = confirmations.iter().collect();
  let executions = executions
    .into_iter()
    .map(|data| {
      let human = pending.contains(&data.node_exec_id)
        || data
          .first_task_exec_id
          .as_ref()
          .is_some_and(|first| pending.contains(first));
      AnnotatedEvent::new(data.clone(), human)
    })
    .collect();

  Normalized {
    confirmations,
    executions,
  }
}
