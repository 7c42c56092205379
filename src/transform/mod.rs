//! Ordered, reversible structural rewrites of one C# file.
//!
//! Every operation parses the text it is handed, rewrites it through the
//! shared [`crate::edit::Edit`] primitive and passes the new text on. The
//! [`CodeEditor`] runs a queue of operations and stops at the first failure.

pub mod async_result;
pub mod block;
pub mod editor;
pub mod errors;
pub mod operation;
pub mod rename;
pub mod replace;
pub mod wrap;

pub use async_result::AsyncReturnOperation;
pub use block::{BlockSelector, BlockWrapOperation, ControlFlow};
pub use editor::{CodeEditor, EditorOptions, Outcome};
pub use errors::{InputError, TransformError};
pub use operation::{
    AsyncStyle, AsyncWrapReport, EditOperation, OperationOutput, RenameKind, WrapKind,
};
pub use rename::RenameOperation;
pub use replace::ReplaceOperation;
pub use wrap::WrapOperation;
