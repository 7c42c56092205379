use crate::cache;
use crate::query::errors::{require_non_empty, QueryError};
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::{AstGrep, NodeMatch};
use ast_grep_language::SupportLang;
use std::collections::HashMap;

/// A match from an ast-grep pattern with captured metavariables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub byte_start: usize,
    pub byte_end: usize,
    pub text: String,
    /// Captured metavariables: name -> text
    pub captures: HashMap<String, String>,
}

/// Find all matches of a structural pattern in C# source.
///
/// Metavariables follow ast-grep: `$NAME` captures one node, `$$$ARGS`
/// captures zero or more, `$_` matches without capturing.
///
/// ```text
/// Console.WriteLine($MSG);
/// $OBJ.Dispose();
/// new $TYPE($$$ARGS)
/// ```
pub fn find_all(source: &str, pattern: &str) -> Result<Vec<PatternMatch>, QueryError> {
    require_non_empty("find_by_pattern", pattern)?;

    let sg = AstGrep::new(source, SupportLang::CSharp);
    let pat = cache::get_or_compile_pattern(pattern).map_err(|e| QueryError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    let root = sg.root();

    Ok(root
        .find_all(&pat)
        .map(|m| to_pattern_match(source, m))
        .collect())
}

/// Matches of `pattern` inside the body of any method named `method`.
pub fn find_in_method(
    source: &str,
    pattern: &str,
    method: &str,
) -> Result<Vec<PatternMatch>, QueryError> {
    require_non_empty("find_in_method", method)?;
    let matches = find_all(source, pattern)?;

    let sg = AstGrep::new(source, SupportLang::CSharp);
    let ranges: Vec<std::ops::Range<usize>> = sg
        .root()
        .dfs()
        .filter(|n| n.kind() == "method_declaration")
        .filter(|n| n.field("name").is_some_and(|name| name.text() == method))
        .map(|n| n.range())
        .collect();

    Ok(matches
        .into_iter()
        .filter(|m| {
            ranges
                .iter()
                .any(|r| m.byte_start >= r.start && m.byte_end <= r.end)
        })
        .collect())
}

fn to_pattern_match(source: &str, m: NodeMatch<StrDoc<SupportLang>>) -> PatternMatch {
    let range = m.get_node().range();
    let captures: HashMap<String, String> = m.get_env().clone().into();
    PatternMatch {
        byte_start: range.start,
        byte_end: range.end,
        text: source[range.start..range.end].to_string(),
        captures,
    }
}
