use std::error::Error;
use std::fmt;

/// A history lookup outside the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    IndexOutOfRange { index: i64, len: usize },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "history index {index} out of range (history has {len} entries)")
            }
        }
    }
}

impl Error for HistoryError {}

/// Failure to bring the publication service up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    Bind { addr: String, reason: String },
    Runtime { reason: String },
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, reason } => write!(f, "failed to bind {addr}: {reason}"),
            Self::Runtime { reason } => write!(f, "failed to start publisher runtime: {reason}"),
        }
    }
}

impl Error for PublishError {}

/// A client request that was understood but could not be answered. Logged
/// and dropped; never reaches the caller.
#[derive(Debug)]
pub(crate) enum RequestError {
    History(HistoryError),
    Encode(String),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::History(err) => write!(f, "{err}"),
            Self::Encode(reason) => write!(f, "failed to encode message: {reason}"),
        }
    }
}

impl From<HistoryError> for RequestError {
    fn from(err: HistoryError) -> Self {
        Self::History(err)
    }
}
