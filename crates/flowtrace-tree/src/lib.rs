//! Flowtrace Tree
//!
//! This crate provides the execution tree that a run panel renders. A tree
//! is derived from a flat list of node execution records in two steps:
//!
//! - [`build_forest`] nests records under their `parent_exec_id`
//! - [`merge_level`] collapses retry chains (records linked through
//!   `first_task_exec_id`) into a single slot per level
//!
//! Both steps are pure. Historical logs that arrive pre-nested from the
//! workflow service go through [`from_history`] so they end up in the same
//! shape as live runs.

mod build;
mod history;
mod merge;
mod node;

pub use build::{OrphanPolicy, build_forest};
pub use history::from_history;
pub use merge::merge_level;
pub use node::{AnnotatedEvent, ExecutionNode, Walk};
