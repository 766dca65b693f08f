//! Flowtrace Event
//!
//! This crate contains the serializable types for the execution event stream
//! produced by a workflow run. These types represent events as they arrive
//! from the push channel, before they are filtered and folded into an
//! execution tree by `flowtrace-engine`.
//!
//! Events can be loaded from:
//! - The live push channel (one JSON object per message)
//! - Log files (JSON array or JSON lines, via the CLI)
//! - The event store (as JSON blobs)
//!
//! Parsing is lenient: ids may be strings or integers, and unknown fields on
//! the node payload are kept verbatim.

mod error;
mod event;
mod history;
mod id;
mod status;

pub use error::EventError;
pub use event::{EventKind, ExecutionEvent, NodeExecData, parse_event};
pub use history::HistoryRecord;
pub use id::{ExecId, RunId};
pub use status::NodeStatus;
