use crate::edit::EditError;
use crate::syntax::SyntaxError;
use thiserror::Error;

/// Invalid arguments, rejected when an operation is queued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("{argument} cannot be empty")]
    Empty { argument: &'static str },

    #[error("'{value}' is not a valid identifier for {argument}")]
    InvalidIdentifier {
        argument: &'static str,
        value: String,
    },

    #[error("statement range {start}..={end} is reversed")]
    InvalidRange { start: usize, end: usize },
}

pub(crate) fn require(argument: &'static str, value: &str) -> Result<(), InputError> {
    if value.trim().is_empty() {
        return Err(InputError::Empty { argument });
    }
    Ok(())
}

/// C# identifier: letter or underscore, then letters, digits or underscores.
/// An `@` prefix for verbatim identifiers is allowed.
pub(crate) fn require_identifier(argument: &'static str, value: &str) -> Result<(), InputError> {
    require(argument, value)?;
    let bare = value.strip_prefix('@').unwrap_or(value);
    let mut chars = bare.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_');
    if !valid {
        return Err(InputError::InvalidIdentifier {
            argument,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Failure of one queued operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("failed to parse input: {0}")]
    Parse(#[from] SyntaxError),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    #[error("Code snippet not found")]
    SnippetNotFound { snippet: String },

    #[error("no statements selected {selector} in method '{method}'")]
    EmptySelection { method: String, selector: String },

    #[error("method '{0}' has no block body")]
    NoBlockBody(String),

    #[error("operation introduced syntax errors: {0}")]
    SyntaxIntroduced(SyntaxError),

    #[error("edit failed: {0}")]
    Edit(String),

    #[error("{0}")]
    Custom(String),
}

impl From<EditError> for TransformError {
    fn from(err: EditError) -> Self {
        TransformError::Edit(err.to_string())
    }
}
