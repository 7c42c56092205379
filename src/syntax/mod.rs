//! Lossless C# syntax trees built on tree-sitter.
//!
//! A [`SyntaxTree`] owns the text it was parsed from, so printing an
//! unmodified tree reproduces the input byte for byte. Rewrites never touch
//! a tree in place: a [`Rewriter`] fold compiles to byte-span
//! [`crate::edit::Edit`]s that produce a new text, which can be parsed again.

pub mod errors;
pub mod node;
pub mod parser;
pub mod rewriter;
pub mod validator;

pub use errors::SyntaxError;
pub use node::{ExpressionKind, NodeKind, Parameter, StatementKind, SyntaxNode};
pub use parser::{CSharpParser, ErrorNode, SyntaxTree};
pub use rewriter::{Rewrite, Rewriter, Rewritten};
pub use validator::{validate_rewrite, validate_snippet, validate_syntax, SnippetCategory};
