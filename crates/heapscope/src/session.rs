use heapscope_graph::{BuildOptions, Inspector, NullPolicy, diff, extract_expr, extract_frame};
use heapscope_types::{Graph, HistoryItem};
use heapscope_web::{Publisher, PublisherConfig};
use tracing::info;

use crate::CommandError;

/// Default snapshots compared by [`Session::visualize_diff`].
pub const DEFAULT_DIFF_OLD: i64 = -2;
pub const DEFAULT_DIFF_NEW: i64 = -1;

/// One debugging session: an inspector over the paused process and the
/// publisher holding the snapshot history.
pub struct Session<I: Inspector> {
    inspector: I,
    publisher: Publisher,
    null_policy: NullPolicy,
}

impl<I: Inspector> Session<I> {
    pub fn new(inspector: I, publisher: Publisher) -> Self {
        Self {
            inspector,
            publisher,
            null_policy: NullPolicy::default(),
        }
    }

    /// Starts a publisher from `config` and wraps it in a session.
    pub fn start(inspector: I, config: PublisherConfig) -> Result<Self, CommandError> {
        Ok(Self::new(inspector, Publisher::start(config)?))
    }

    pub fn with_null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }

    pub fn inspector(&self) -> &I {
        &self.inspector
    }

    pub fn inspector_mut(&mut self) -> &mut I {
        &mut self.inspector
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    fn options(&self) -> BuildOptions {
        BuildOptions::default().with_null_policy(self.null_policy)
    }

    /// Extracts everything reachable from `expr` and pushes it, titled with
    /// the expression. The snapshot is not remembered.
    pub fn visualize_expr(&self, expr: &str) -> Result<Graph, CommandError> {
        let graph = extract_expr(&self.inspector, expr, self.options())?;
        self.publisher.publish_titled(expr, &graph);
        info!(expr, nodes = graph.nodes.len(), "visualized expression");
        Ok(graph)
    }

    /// Extracts every initialized frame variable pointing to `type_name`,
    /// remembers the snapshot under the current stop location and pushes it.
    /// Returns the history index.
    pub fn visualize_type(&self, type_name: &str) -> Result<usize, CommandError> {
        let graph = extract_frame(&self.inspector, type_name, self.options())?;
        let location = self.inspector.location();
        let nodes = graph.nodes.len();
        let index = self.publisher.publish_labeled(graph, location);
        info!(type_name, index, nodes, "remembered snapshot");
        Ok(index)
    }

    /// Pushes the diff of history entries `old` and `new`, titled
    /// `diff #<old>-#<new>` with absolute indices.
    pub fn visualize_diff(&self, old: i64, new: i64) -> Result<Graph, CommandError> {
        let (old_index, before) = self.publisher.snapshot(old)?;
        let (new_index, after) = self.publisher.snapshot(new)?;
        let delta = diff(&before, &after);
        self.publisher
            .publish_titled(&format!("diff #{old_index}-#{new_index}"), &delta);
        info!(old_index, new_index, "visualized diff");
        Ok(delta)
    }

    /// Diff of the two most recent snapshots.
    pub fn visualize_latest_diff(&self) -> Result<Graph, CommandError> {
        self.visualize_diff(DEFAULT_DIFF_OLD, DEFAULT_DIFF_NEW)
    }

    /// Remembered snapshots, most recent first.
    pub fn list_history(&self) -> Vec<HistoryItem> {
        self.publisher.history_listing()
    }
}

/// One `#<index>: <label>` line per item.
pub fn format_history(items: &[HistoryItem]) -> String {
    items
        .iter()
        .map(|item| format!("#{}: {}", item.index, item.label))
        .collect::<Vec<_>>()
        .join("\n")
}
