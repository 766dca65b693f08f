//! Reconciliation behavior of the full pipeline through the query facade.

use flowtrace_engine::{
  ExecId, NodeStatus, OrphanPolicy, RunId, TraceConfig, TraceEngine, parse_batch, reconcile,
};
use serde_json::{Value, json};

fn run_debug(run: i64, data: Value) -> Value {
  json!({"type": "run_debug", "data": {"app_run_id": run, "node_exec_data": data}})
}

fn confirm(run: i64, id: i64) -> Value {
  json!({
    "type": "need_human_confirm",
    "data": {"app_run_id": run, "node_exec_data": {"node_exec_id": id}}
  })
}

fn engine_with(events: Vec<Value>) -> TraceEngine {
  let mut engine = TraceEngine::for_run(TraceConfig::default(), RunId::from(5));
  engine.ingest(events);
  engine
}

fn top_ids(engine: &TraceEngine) -> Vec<String> {
  engine.tree().iter().map(|n| n.id.to_string()).collect()
}

#[test]
fn test_scenario_retry_keeps_first_id() {
  let engine = engine_with(vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    run_debug(
      5,
      json!({"node_exec_id": 2, "first_task_exec_id": 1, "status": 2, "parent_exec_id": null}),
    ),
  ]);

  let tree = serde_json::to_value(engine.tree()).unwrap();
  assert_eq!(tree.as_array().unwrap().len(), 1);
  assert_eq!(tree[0]["id"], "1");
  assert_eq!(tree[0]["payload"]["status"], 2);
  assert_eq!(tree[0]["children"], json!([]));
}

#[test]
fn test_retry_collapse() {
  let engine = engine_with(vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    run_debug(5, json!({"node_exec_id": 2, "first_task_exec_id": 1, "status": 2})),
  ]);

  assert_eq!(top_ids(&engine), vec!["1"]);
  let slot = &engine.tree()[0];
  assert_eq!(slot.payload.node_exec_id, ExecId::from(2));
  assert_eq!(slot.payload.status, NodeStatus::SUCCESS);
  assert!(engine.tree().iter().all(|n| n.id != ExecId::from(2)));
}

#[test]
fn test_parent_child_nesting() {
  let engine = engine_with(vec![
    run_debug(5, json!({"node_exec_id": 10, "status": 1})),
    run_debug(5, json!({"node_exec_id": 11, "parent_exec_id": 10, "status": 1})),
  ]);

  assert_eq!(top_ids(&engine), vec!["10"]);
  let children: Vec<String> = engine.tree()[0]
    .children
    .iter()
    .map(|n| n.id.to_string())
    .collect();
  assert_eq!(children, vec!["11"]);
}

#[test]
fn test_end_node_is_last_terminal() {
  let engine = engine_with(vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    run_debug(5, json!({"node_exec_id": 2, "status": 2})),
    run_debug(5, json!({"node_exec_id": 3, "status": 3})),
  ]);

  let end = engine.end_node().unwrap();
  assert_eq!(end.id, ExecId::from(3));
  assert_eq!(end.payload.status, NodeStatus::FAILED);
}

#[test]
fn test_end_node_follows_retry() {
  let engine = engine_with(vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 2})),
    run_debug(5, json!({"node_exec_id": 2, "status": 3})),
    run_debug(5, json!({"node_exec_id": 3, "first_task_exec_id": 2, "status": 2})),
  ]);

  let end = engine.end_node().unwrap();
  assert_eq!(end.id, ExecId::from(2));
  assert_eq!(end.payload.node_exec_id, ExecId::from(3));
}

#[test]
fn test_duplicate_delivery_is_idempotent() {
  let events = vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    run_debug(5, json!({"node_exec_id": 11, "parent_exec_id": 1, "status": 1})),
    run_debug(5, json!({"node_exec_id": 2, "first_task_exec_id": 1, "status": 2})),
  ];

  let once = engine_with(events.clone());

  let mut doubled = events.clone();
  doubled.extend(events.clone());
  doubled.push(events[0].clone());
  let twice = engine_with(doubled);

  assert_eq!(once.tree(), twice.tree());
  assert_eq!(once.end_node(), twice.end_node());
}

#[test]
fn test_unrelated_events_converge_regardless_of_order() {
  let events = vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 2})),
    run_debug(5, json!({"node_exec_id": 2, "status": 1})),
    run_debug(5, json!({"node_exec_id": 3, "parent_exec_id": 1, "status": 1})),
  ];
  let mut reversed = events.clone();
  reversed.reverse();

  let forward = engine_with(events);
  let backward = engine_with(reversed);

  let mut a = top_ids(&forward);
  let mut b = top_ids(&backward);
  a.sort();
  b.sort();
  assert_eq!(a, b);

  let nested = |engine: &TraceEngine| {
    engine
      .tree()
      .iter()
      .find(|n| n.id == ExecId::from(1))
      .map(|n| n.children.len())
  };
  assert_eq!(nested(&forward), Some(1));
  assert_eq!(nested(&backward), Some(1));
}

#[test]
fn test_prefix_extension_keeps_positions() {
  let prefix = vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    run_debug(5, json!({"node_exec_id": 2, "status": 1})),
    run_debug(5, json!({"node_exec_id": 3, "status": 1})),
  ];
  let mut engine = engine_with(prefix);
  let before = top_ids(&engine);

  engine.ingest(vec![
    run_debug(5, json!({"node_exec_id": 4, "first_task_exec_id": 2, "status": 2})),
    run_debug(5, json!({"node_exec_id": 5, "status": 1})),
  ]);

  let after = top_ids(&engine);
  assert_eq!(&after[..before.len()], &before[..]);
  assert_eq!(after, vec!["1", "2", "3", "5"]);
}

#[test]
fn test_backlog_resolution() {
  let mut engine = engine_with(vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    run_debug(5, json!({"node_exec_id": 2, "parent_exec_id": 1, "status": 1})),
    confirm(5, 2),
  ]);

  assert_eq!(engine.backlog_count(), 1);
  assert_eq!(engine.backlog()[0].id, ExecId::from(2));

  assert_eq!(engine.resolve(&ExecId::from(2)), 1);
  assert_eq!(engine.backlog_count(), 0);

  engine.ingest(vec![run_debug(
    5,
    json!({"node_exec_id": 2, "parent_exec_id": 1, "status": 2}),
  )]);
  assert_eq!(engine.backlog_count(), 0);
  assert!(!engine.tree()[0].children[0].human);
}

#[test]
fn test_confirmation_on_first_attempt_flags_retry() {
  let mut engine = engine_with(vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    confirm(5, 1),
    run_debug(5, json!({"node_exec_id": 7, "first_task_exec_id": 1, "status": 1})),
  ]);

  assert_eq!(engine.backlog_count(), 1);
  assert!(engine.tree()[0].human);

  assert_eq!(engine.resolve(&ExecId::from(7)), 1);
  assert!(!engine.tree()[0].human);
}

#[test]
fn test_resolve_without_confirmation_is_noop() {
  let mut engine = engine_with(vec![run_debug(5, json!({"node_exec_id": 1, "status": 1}))]);
  let before = engine.snapshot().clone();

  assert_eq!(engine.resolve(&ExecId::from(1)), 0);
  assert_eq!(engine.snapshot(), &before);
}

#[test]
fn test_events_for_other_runs_are_ignored() {
  let engine = engine_with(vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    run_debug(6, json!({"node_exec_id": 2, "status": 2})),
    confirm(6, 1),
  ]);

  assert_eq!(top_ids(&engine), vec!["1"]);
  assert_eq!(engine.backlog_count(), 0);
  assert!(engine.end_node().is_none());
}

#[test]
fn test_malformed_events_are_dropped() {
  let mut engine = TraceEngine::for_run(TraceConfig::default(), RunId::from(5));
  let appended = engine.ingest(vec![
    json!({"type": "run_debug", "data": {"app_run_id": 5}}),
    json!({"type": "run_debug"}),
    json!(null),
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
  ]);

  assert_eq!(appended, 1);
  assert_eq!(top_ids(&engine), vec!["1"]);
}

#[test]
fn test_orphan_heals_when_parent_arrives() {
  let mut engine = engine_with(vec![run_debug(
    5,
    json!({"node_exec_id": 11, "parent_exec_id": 10, "status": 1}),
  )]);
  assert!(engine.tree().is_empty());

  engine.ingest(vec![run_debug(5, json!({"node_exec_id": 10, "status": 1}))]);
  assert_eq!(top_ids(&engine), vec!["10"]);
  assert_eq!(engine.tree()[0].children.len(), 1);
}

#[test]
fn test_orphan_promotion_policy() {
  let config = TraceConfig {
    orphans: OrphanPolicy::Promote,
    ..Default::default()
  };
  let log = parse_batch(vec![run_debug(
    5,
    json!({"node_exec_id": 11, "parent_exec_id": 10, "status": 1}),
  )]);

  let snapshot = reconcile(&log, &RunId::from(5), &config);
  assert_eq!(snapshot.tree.len(), 1);
  assert_eq!(snapshot.tree[0].id, ExecId::from(11));
}

#[test]
fn test_reconcile_is_pure() {
  let log = parse_batch(vec![
    run_debug(5, json!({"node_exec_id": 1, "status": 1})),
    run_debug(5, json!({"node_exec_id": 2, "first_task_exec_id": 1, "status": 2})),
    confirm(5, 2),
  ]);

  let config = TraceConfig::default();
  let a = reconcile(&log, &RunId::from(5), &config);
  let b = reconcile(&log, &RunId::from(5), &config);
  assert_eq!(a, b);
  assert_eq!(a.backlog.len(), 1);
  assert_eq!(a.end_node.as_ref().map(|n| n.id.clone()), Some(ExecId::from(1)));
}
