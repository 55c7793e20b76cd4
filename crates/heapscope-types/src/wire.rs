//! Messages exchanged with the streaming client, encoded as JSON text frames.
//!
//! Server -> client: [`ServedGraph`] (`type: "graph"`) and [`ServedHistory`]
//! (`type: "history"`). Client -> server: [`ClientRequest`], decoded into a
//! [`Request`] with [`Request::decode`].

use std::error::Error;
use std::fmt;

use facet::Facet;

use crate::{HistoryLabel, LayoutGraph};

pub const GRAPH_MESSAGE_TYPE: &str = "graph";
pub const HISTORY_MESSAGE_TYPE: &str = "history";

/// One row of the history listing.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub index: usize,
    pub label: HistoryLabel,
}

/// A rendered graph pushed to the client.
#[derive(Facet, Debug, Clone)]
pub struct ServedGraph {
    pub r#type: String,
    pub title: String,
    pub graph: LayoutGraph,
    /// Present when the graph was remembered in history: the refreshed
    /// listing, most recent first.
    pub history: Option<Vec<HistoryItem>>,
}

impl ServedGraph {
    pub fn new(
        title: impl Into<String>,
        graph: LayoutGraph,
        history: Option<Vec<HistoryItem>>,
    ) -> Self {
        Self {
            r#type: GRAPH_MESSAGE_TYPE.to_string(),
            title: title.into(),
            graph,
            history,
        }
    }
}

/// Reply to a `{"type":"history"}` request.
#[derive(Facet, Debug, Clone)]
pub struct ServedHistory {
    pub r#type: String,
    pub history: Vec<HistoryItem>,
}

impl ServedHistory {
    pub fn new(history: Vec<HistoryItem>) -> Self {
        Self {
            r#type: HISTORY_MESSAGE_TYPE.to_string(),
            history,
        }
    }
}

/// Raw client request as it appears on the wire.
#[derive(Facet, Debug, Clone)]
pub struct ClientRequest {
    pub r#type: String,
    #[facet(default)]
    pub index: Option<i64>,
}

/// A decoded client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Full history listing.
    History,
    /// Layout graph of the history entry at `index` (negative counts from
    /// the most recent entry).
    Graph { index: i64 },
}

impl Request {
    pub fn decode(text: &str) -> Result<Self, MalformedRequest> {
        let raw: ClientRequest = facet_json::from_str(text)
            .map_err(|error| MalformedRequest::InvalidJson(error.to_string()))?;
        match raw.r#type.as_str() {
            HISTORY_MESSAGE_TYPE => Ok(Self::History),
            GRAPH_MESSAGE_TYPE => raw
                .index
                .map(|index| Self::Graph { index })
                .ok_or(MalformedRequest::MissingIndex),
            _ => Err(MalformedRequest::UnknownType(raw.r#type)),
        }
    }
}

/// A client message that could not be understood. Never fatal to the
/// connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRequest {
    InvalidJson(String),
    UnknownType(String),
    MissingIndex,
}

impl fmt::Display for MalformedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(reason) => write!(f, "request is not valid json: {reason}"),
            Self::UnknownType(kind) => write!(f, "unknown request type {kind:?}"),
            Self::MissingIndex => write!(f, "graph request is missing `index`"),
        }
    }
}

impl Error for MalformedRequest {}
