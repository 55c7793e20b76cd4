//! Live visualization of pointer-linked data structures.
//!
//! heapscope walks linked lists, trees and arbitrary record graphs in a
//! paused process, turns them into node/link graphs, remembers snapshots as
//! the program is stepped, and streams them to a browser frontend over a
//! websocket. Consecutive snapshots can be diffed to see exactly which
//! fields and pointers changed.
//!
//! # Using this crate
//!
//! Implement [`Inspector`] for your debugger (or use the in-memory
//! [`synthetic::SyntheticHeap`]), start a [`Publisher`], and drive a
//! [`Session`]:
//!
//! ```rust,no_run
//! use heapscope::synthetic::{LIST_NODE, SyntheticHeap};
//! use heapscope::{Publisher, PublisherConfig, Session};
//!
//! let mut heap = SyntheticHeap::new();
//! let nodes = heap.list(&[1, 2, 3]);
//! heap.bind("head", LIST_NODE, nodes[0], 1);
//! heap.stop_at(2);
//!
//! let publisher = Publisher::start(PublisherConfig::from_env()).unwrap();
//! let mut session = Session::new(heap, publisher);
//! session.visualize_type(LIST_NODE).unwrap();
//!
//! session.inspector_mut().set_int(nodes[1], "val", 20);
//! session.inspector_mut().stop_at(3);
//! session.visualize_type(LIST_NODE).unwrap();
//!
//! session.visualize_diff(-2, -1).unwrap();
//! ```
//!
//! Point the frontend at `ws://127.0.0.1:8765/ws` (override with
//! `HEAPSCOPE_LISTEN`).
//!
//! # Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | [`Session::visualize_expr`] | Extract from one expression and push it. Not remembered. |
//! | [`Session::visualize_type`] | Extract every initialized frame variable of a record type, remember it, push it. |
//! | [`Session::visualize_diff`] | Push the diff of two remembered snapshots. |
//! | [`Session::list_history`] | Remembered snapshots, most recent first. |

mod error;
mod session;

pub use error::CommandError;
pub use session::{DEFAULT_DIFF_NEW, DEFAULT_DIFF_OLD, Session, format_history};

pub use heapscope_graph::{
    BuildOptions, ExtractError, Field, FieldKind, GraphBuilder, Inspector, NullPolicy, TypeFilter,
    diff, extract_expr, extract_frame, render_label, synthetic, to_layout,
};
pub use heapscope_types::*;
pub use heapscope_web::{
    DEFAULT_LISTEN_ADDR, History, HistoryEntry, HistoryError, LISTEN_ENV, PublishError, Publisher,
    PublisherConfig,
};
