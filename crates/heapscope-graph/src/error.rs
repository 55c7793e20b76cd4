use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The builder was handed a value it must never see: an invalid handle,
    /// or something other than a pointer to an allowed record type. This is
    /// a caller bug; the command fails, the session carries on.
    InvariantViolation { reason: String },
    /// The inspector could not evaluate an expression.
    Evaluate { expr: String, reason: String },
}

impl ExtractError {
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvariantViolation { reason } => write!(f, "invariant violated: {reason}"),
            Self::Evaluate { expr, reason } => write!(f, "failed to evaluate `{expr}`: {reason}"),
        }
    }
}

impl Error for ExtractError {}
