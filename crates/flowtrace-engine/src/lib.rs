//! Flowtrace Engine
//!
//! This crate folds the live execution event stream of a workflow run into
//! the tree a run panel renders.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TraceRunner                          │
//! │  - owns mpsc channel of SourceMessage                       │
//! │  - start(cancel) drives one TraceEngine                     │
//! │  - publishes TraceUpdate through a TraceNotifier            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TraceEngine                          │
//! │  - accumulated event log for the observed run               │
//! │  - tree() / end_node() / backlog() / resolve(id)            │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                reconcile(log, run_id, config)               │
//! │  normalize → build_forest → merge_level → end / backlog     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every change to the log re-runs [`reconcile`] over the whole log. The
//! output depends only on the log contents and the observed run.
//!
//! # Usage
//!
//! ```ignore
//! use flowtrace_engine::{TraceConfig, TraceEngine};
//!
//! let mut engine = TraceEngine::new(TraceConfig::default());
//! engine.observe(run_id);
//! engine.ingest(batch);
//!
//! for node in engine.tree() {
//!     render(node);
//! }
//! ```

mod config;
mod end;
mod engine;
mod error;
mod events;
mod human;
mod normalize;
mod reconcile;
mod runner;

pub use config::{StatusClass, StatusCodes, TraceConfig};
pub use end::find_end_node;
pub use engine::TraceEngine;
pub use error::EngineError;
pub use events::{ChannelNotifier, NoopNotifier, TraceNotifier, TraceUpdate};
pub use human::{collect_backlog, resolve_confirmations};
pub use normalize::{Normalized, normalize, parse_batch};
pub use reconcile::{Snapshot, reconcile};
pub use runner::{SourceMessage, TraceRunner};

pub use flowtrace_event::{ExecId, ExecutionEvent, NodeStatus, RunId};
pub use flowtrace_tree::{ExecutionNode, OrphanPolicy};
