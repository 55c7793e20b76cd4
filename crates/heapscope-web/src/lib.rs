//! Snapshot history and live publication for heapscope.
//!
//! The [`Publisher`] is started once per debugging session. It owns the
//! [`History`] of remembered snapshots and a websocket endpoint serving at
//! most one frontend at a time. Extraction code calls into it from a plain
//! synchronous thread; nothing on that side ever waits for the client.

mod config;
mod error;
mod history;
mod protocol;
mod service;

pub use config::{DEFAULT_LISTEN_ADDR, LISTEN_ENV, PublisherConfig};
pub use error::{HistoryError, PublishError};
pub use history::{History, HistoryEntry};
pub use service::{Publisher, UNTITLED};
