use thiserror::Error;

/// Rejected mapping rule, raised when the rule is added.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("'{path}' is not a valid {field}")]
    InvalidPath { field: &'static str, path: String },
}

fn is_identifier(segment: &str) -> bool {
    let bare = segment.strip_prefix('@').unwrap_or(segment);
    let mut chars = bare.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Every dot-separated segment must be a C# identifier.
pub(crate) fn require_path(field: &'static str, path: &str) -> Result<(), MappingError> {
    if path.trim().is_empty() {
        return Err(MappingError::EmptyField { field });
    }
    if !path.split('.').all(is_identifier) {
        return Err(MappingError::InvalidPath {
            field,
            path: path.to_string(),
        });
    }
    Ok(())
}
