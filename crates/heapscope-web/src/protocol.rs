use heapscope_types::{HistoryItem, LayoutGraph, ServedGraph, ServedHistory};

use crate::error::RequestError;

pub(crate) fn graph_message(
    title: &str,
    graph: LayoutGraph,
    history: Option<Vec<HistoryItem>>,
) -> Result<String, RequestError> {
    let message = ServedGraph::new(title, graph, history);
    facet_json::to_string(&message).map_err(|e| RequestError::Encode(e.to_string()))
}

pub(crate) fn history_message(history: Vec<HistoryItem>) -> Result<String, RequestError> {
    let message = ServedHistory::new(history);
    facet_json::to_string(&message).map_err(|e| RequestError::Encode(e.to_string()))
}
