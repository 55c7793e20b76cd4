use std::error::Error;
use std::fmt;

use heapscope_graph::ExtractError;
use heapscope_web::{HistoryError, PublishError};

/// Why an operator command failed. The session stays usable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Extract(ExtractError),
    History(HistoryError),
    Publish(PublishError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extract(err) => write!(f, "extraction failed: {err}"),
            Self::History(err) => write!(f, "{err}"),
            Self::Publish(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Extract(err) => Some(err),
            Self::History(err) => Some(err),
            Self::Publish(err) => Some(err),
        }
    }
}

impl From<ExtractError> for CommandError {
    fn from(err: ExtractError) -> Self {
        Self::Extract(err)
    }
}

impl From<HistoryError> for CommandError {
    fn from(err: HistoryError) -> Self {
        Self::History(err)
    }
}

impl From<PublishError> for CommandError {
    fn from(err: PublishError) -> Self {
        Self::Publish(err)
    }
}
