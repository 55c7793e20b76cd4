//! Core graph nomenclature used across heapscope.
//!
//! - `Graph`: a snapshot of a pointer-linked structure, extracted from a live
//!   process. Nodes are records (one per distinct address), links are the
//!   pointer fields connecting them.
//! - `LayoutGraph`: a render-oriented projection of a `Graph`, with name
//!   nodes and grouping hints for a constraint layout engine.
//! - `HistoryLabel`: where in the debuggee a snapshot was captured.
//!
//! In short: graphs are captured, remembered under a label, diffed against
//! each other, and projected to layout graphs for the frontend.

pub(crate) mod graph;
pub(crate) mod history;
pub(crate) mod layout;
pub(crate) mod wire;

pub use graph::*;
pub use history::*;
pub use layout::*;
pub use wire::*;
