use crate::syntax::SyntaxError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid argument to {filter}: {reason}")]
    InvalidArgument {
        filter: &'static str,
        reason: String,
    },

    #[error("no statement spans bytes {byte_start}..{byte_end}")]
    StatementNotFound { byte_start: usize, byte_end: usize },

    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Reject empty or whitespace-only filter arguments.
pub(crate) fn require_non_empty(filter: &'static str, value: &str) -> Result<(), QueryError> {
    if value.trim().is_empty() {
        return Err(QueryError::InvalidArgument {
            filter,
            reason: "value must not be empty".to_string(),
        });
    }
    Ok(())
}
