use crate::edit::{Edit, EditError};
use crate::syntax::errors::SyntaxError;
use crate::syntax::node::SyntaxNode;
use crate::syntax::rewriter::{fold, Rewriter, Rewritten};
use ast_grep_language::{LanguageExt, SupportLang};
use tree_sitter::{Parser, Tree};

/// Tree-sitter parser wrapper for C# source code.
pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    /// Create a new C# parser.
    pub fn new() -> Result<Self, SyntaxError> {
        let mut parser = Parser::new();
        // The C# grammar comes from ast-grep-language
        let ts_lang = SupportLang::CSharp.get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| SyntaxError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, SyntaxError> {
        self.parser
            .parse(source, None)
            .ok_or(SyntaxError::ParseFailed)
    }
}

/// Immutable, lossless snapshot of one parsed C# file.
///
/// The tree owns its source text, so printing an unmodified tree is exact:
/// whitespace, comments and formatting all live in the source between the
/// spans of the grammar nodes.
pub struct SyntaxTree {
    source: String,
    tree: Tree,
}

impl SyntaxTree {
    /// Parse `text`, failing if it is empty or contains syntax errors.
    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        if text.trim().is_empty() {
            return Err(SyntaxError::EmptySource);
        }

        let tree = Self::parse_lenient(text)?;
        match tree.malformed() {
            Some(err) => Err(err),
            None => Ok(tree),
        }
    }

    /// The `Malformed` error describing this tree, if it has any errors.
    pub fn malformed(&self) -> Option<SyntaxError> {
        if !self.has_errors() {
            return None;
        }
        let errors = self.error_nodes();
        let root = self.tree.root_node();
        let first = errors.first().cloned().unwrap_or_else(|| ErrorNode::at(root));
        Some(SyntaxError::Malformed {
            count: errors.len().max(1),
            byte_start: first.byte_start,
            byte_end: first.byte_end,
            line: first.line,
            column: first.column,
        })
    }

    /// Parse `text` keeping any ERROR nodes in the tree.
    pub fn parse_lenient(text: &str) -> Result<Self, SyntaxError> {
        let tree = crate::pool::with_parser(|parser| parser.parse(text))??;
        Ok(Self {
            source: text.to_string(),
            tree,
        })
    }

    /// Print the tree back to text.
    pub fn print(&self) -> &str {
        &self.source
    }

    /// Get the root node of the tree.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode::new(self.tree.root_node(), &self.source)
    }

    /// Check if the tree contains any ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Get all ERROR and MISSING nodes in the tree.
    ///
    /// A MISSING token the grammar hides is reported as its innermost
    /// visible ancestor.
    pub fn error_nodes(&self) -> Vec<ErrorNode> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &mut errors);
        errors
    }

    /// Fold the tree through `rewriter` and splice the resulting edits.
    pub fn rewrite<R: Rewriter>(&self, rewriter: &mut R) -> Result<Rewritten, EditError> {
        let edits = fold(self.root(), rewriter);
        let replacements = edits.len();
        let text = Edit::apply_all(&self.source, edits)?;
        Ok(Rewritten { text, replacements })
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("len", &self.source.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

/// Information about an ERROR node in the parse tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNode {
    pub byte_start: usize,
    pub byte_end: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl ErrorNode {
    fn at(node: tree_sitter::Node<'_>) -> Self {
        let start = node.start_position();
        Self {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            line: start.row + 1,
            column: start.column + 1,
        }
    }
}

fn collect_error_nodes(node: tree_sitter::Node<'_>, errors: &mut Vec<ErrorNode>) {
    if !node.has_error() && !node.is_missing() {
        return;
    }

    let is_error = node.is_error() || node.is_missing();
    if is_error {
        errors.push(ErrorNode::at(node));
    }

    let mut cursor = node.walk();
    let mut child_has_error = false;
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            child_has_error = true;
            collect_error_nodes(child, errors);
        }
    }

    // Hidden MISSING leaves are not visited as children
    if !is_error && !child_has_error {
        errors.push(ErrorNode::at(node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_csharp() {
        let source = "public class Foo { public void Bar() { } }";
        let tree = SyntaxTree::parse(source).unwrap();

        assert!(!tree.has_errors());
        assert_eq!(tree.root().ts_kind(), "compilation_unit");
    }

    #[test]
    fn parse_invalid_csharp() {
        let source = "public class Foo { public void Bar( { }";
        let result = SyntaxTree::parse(source);

        assert!(matches!(result, Err(SyntaxError::Malformed { .. })));
    }

    #[test]
    fn lenient_parse_keeps_errors() {
        let source = "public class Foo { public void Bar( { }";
        let tree = SyntaxTree::parse_lenient(source).unwrap();

        assert!(tree.has_errors());
        assert!(!tree.error_nodes().is_empty());
    }

    #[test]
    fn hidden_missing_token_is_rejected() {
        let dangling = "class A { void M() { var x = 1 +; } }";
        let err = SyntaxTree::parse(dangling).unwrap_err();
        let SyntaxError::Malformed { line, byte_start, .. } = err else {
            panic!("expected Malformed, got {err:?}");
        };
        assert_eq!(line, 1);
        assert!(byte_start >= dangling.find('+').unwrap());

        assert!(SyntaxTree::parse("class A { int M(int a,int b){ return a +; } }").is_err());

        let tree = SyntaxTree::parse_lenient(dangling).unwrap();
        assert!(tree.has_errors());
        assert!(!tree.error_nodes().is_empty());
    }

    #[test]
    fn empty_source_is_rejected() {
        assert_eq!(SyntaxTree::parse("  \n ").unwrap_err(), SyntaxError::EmptySource);
    }

    #[test]
    fn print_is_exact() {
        let source = "// header\nnamespace App\n{\n    class A   { int x = 1; /* trailing */ }\n}\n";
        let tree = SyntaxTree::parse(source).unwrap();
        assert_eq!(tree.print(), source);
    }
}
