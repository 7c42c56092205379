//! csharp-refactor: structural query, rewrite and property-path migration
//! for C# sources.
//!
//! Three engines share one lossless syntax tree (tree-sitter's C# grammar)
//! and one editing primitive:
//!
//! - [`query`]: fluent, predicate-based search for methods, classes,
//!   members, return statements and control-flow statements.
//! - [`transform`]: an ordered pipeline of rename, wrap, replace and
//!   async-return rewrites that halts on the first failure.
//! - [`mapping`]: priority-ranked rules that redirect legacy property
//!   accesses to new dotted paths.
//!
//! # Architecture
//!
//! All rewrites compile down to a single primitive: [`Edit`], a verified
//! byte-span replacement. Intelligence lives in span acquisition (tree
//! folds and structural queries), not in the application logic. Bytes no
//! rewrite touches are preserved exactly.
//!
//! # Example
//!
//! ```
//! use csharp_refactor::transform::CodeEditor;
//!
//! let mut editor = CodeEditor::new("class A { int M(){ return 1; } }");
//! editor
//!     .rename_class("A", "B")
//!     .unwrap()
//!     .replace("return 1;", "return 2;")
//!     .unwrap();
//! let outcome = editor.apply();
//! assert!(outcome.is_success());
//! assert_eq!(outcome.text(), "class B { int M(){ return 2; } }");
//! ```

pub mod cache;
pub mod config;
pub mod edit;
pub mod mapping;
pub mod observer;
pub mod pool;
pub mod query;
pub mod syntax;
pub mod transform;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, RefactorConfig};
pub use edit::{Edit, EditError, EditVerification};
pub use mapping::{MappingEngine, MappingOutcome, MappingRule};
pub use observer::{MemoryObserver, NullObserver, Observer, TracingObserver};
pub use query::{QueryError, SearchContext};
pub use syntax::{NodeKind, SyntaxError, SyntaxNode, SyntaxTree};
pub use transform::{CodeEditor, InputError, Outcome, TransformError};
