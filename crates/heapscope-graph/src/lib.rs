//! Graph extraction and comparison for heapscope.
//!
//! Walks a pointer-linked structure through an [`Inspector`] and turns it
//! into a [`Graph`](heapscope_types::Graph): one node per distinct live
//! address, one link per pointer field. Two graphs can be compared with
//! [`diff`], and any graph can be projected for rendering with
//! [`to_layout`].

mod builder;
mod capture;
mod diff;
mod error;
mod inspect;
mod layout;
pub mod synthetic;

pub use builder::{BuildOptions, GraphBuilder, NullPolicy};
pub use capture::{extract_expr, extract_frame};
pub use diff::diff;
pub use error::ExtractError;
pub use inspect::{Field, FieldKind, Inspector, TypeFilter};
pub use layout::{render_label, to_layout};
