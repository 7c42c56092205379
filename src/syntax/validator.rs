use crate::syntax::errors::SyntaxError;
use crate::syntax::parser::SyntaxTree;

/// Validate that C# source code has no syntax errors.
pub fn validate_syntax(source: &str) -> Result<(), SyntaxError> {
    match SyntaxTree::parse_lenient(source)?.malformed() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Validate that rewriting `before` into `after` introduced no new syntax errors.
///
/// Text that was already broken only fails if the rewrite added errors.
pub fn validate_rewrite(before: &str, after: &str) -> Result<(), SyntaxError> {
    let before = SyntaxTree::parse_lenient(before)?;
    let after = SyntaxTree::parse_lenient(after)?;
    if !after.has_errors() {
        return Ok(());
    }

    let introduced =
        !before.has_errors() || after.error_nodes().len() > before.error_nodes().len();
    match after.malformed() {
        Some(err) if introduced => Err(err),
        _ => Ok(()),
    }
}

/// Check if a code snippet is valid as a specific syntactic category.
pub fn validate_snippet(snippet: &str, category: SnippetCategory) -> Result<(), SyntaxError> {
    let wrapped = match category {
        SnippetCategory::Member => format!("class __Wrapper__ {{ {snippet} }}"),
        SnippetCategory::Statement => {
            format!("class __Wrapper__ {{ void __M__() {{ {snippet} }} }}")
        }
        SnippetCategory::Expression => {
            format!("class __Wrapper__ {{ void __M__() {{ var __x__ = {snippet}; }} }}")
        }
        SnippetCategory::Block => format!("class __Wrapper__ {{ void __M__() {snippet} }}"),
    };

    validate_syntax(&wrapped).map_err(|e| SyntaxError::InvalidSnippet {
        category: category.to_string(),
        message: e.to_string(),
    })
}

/// Category of code snippet for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetCategory {
    /// A class member (method, field, property)
    Member,
    /// One or more statements
    Statement,
    /// An expression
    Expression,
    /// A braced method body
    Block,
}

impl std::fmt::Display for SnippetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SnippetCategory::Member => "member",
            SnippetCategory::Statement => "statement",
            SnippetCategory::Expression => "expression",
            SnippetCategory::Block => "block",
        };
        f.write_str(s)
    }
}
