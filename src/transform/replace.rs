use crate::edit::Edit;
use crate::transform::errors::{require, InputError, TransformError};
use crate::transform::operation::{EditOperation, OperationOutput};

/// Literal substring replacement of every occurrence, left to right.
///
/// Works on text, not trees, so it also applies to files that do not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOperation {
    old: String,
    new: String,
}

impl ReplaceOperation {
    pub fn new(old: &str, new: &str) -> Result<Self, InputError> {
        require("old code", old)?;
        Ok(Self {
            old: old.to_string(),
            new: new.to_string(),
        })
    }
}

impl EditOperation for ReplaceOperation {
    fn description(&self) -> String {
        "Replace code snippet".to_string()
    }

    fn execute(&self, text: &str) -> Result<OperationOutput, TransformError> {
        let edits: Vec<Edit> = text
            .match_indices(&self.old)
            .map(|(start, found)| Edit::new(start, start + found.len(), self.new.clone(), found))
            .collect();

        if edits.is_empty() {
            return Err(TransformError::SnippetNotFound {
                snippet: self.old.clone(),
            });
        }

        let count = edits.len();
        let new_text = Edit::apply_all(text, edits)?;
        Ok(OperationOutput::new(
            new_text,
            format!("Replaced code snippet ({count} occurrence(s))"),
        ))
    }
}
