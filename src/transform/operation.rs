use crate::transform::errors::TransformError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What one successful operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutput {
    pub text: String,
    /// The single change-log line for this operation.
    pub change: String,
    pub async_report: Option<AsyncWrapReport>,
}

impl OperationOutput {
    pub fn new(text: String, change: impl Into<String>) -> Self {
        Self {
            text,
            change: change.into(),
            async_report: None,
        }
    }
}

/// A named, pure function from text to rewritten text.
///
/// Implementations parse the text they are given, never the text they were
/// built against, so they compose in a pipeline.
pub trait EditOperation: Send + Sync {
    fn description(&self) -> String;

    fn execute(&self, text: &str) -> Result<OperationOutput, TransformError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameKind {
    Method,
    Class,
    Variable,
    Property,
}

impl fmt::Display for RenameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RenameKind::Method => "method",
            RenameKind::Class => "class",
            RenameKind::Variable => "variable",
            RenameKind::Property => "property",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapKind {
    TryCatch,
    Logging,
    Validation,
}

impl fmt::Display for WrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WrapKind::TryCatch => "try-catch",
            WrapKind::Logging => "logging",
            WrapKind::Validation => "validation",
        };
        f.write_str(s)
    }
}

/// How `return expr;` is rewritten inside a method made async.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AsyncStyle {
    /// `return Task.FromResult(expr);`
    #[default]
    ValueWrap,
    /// `return await Task.FromResult(expr);`
    AwaitWrap,
    /// `Task.CompletedTask` for void methods, otherwise value-wrap.
    Auto,
}

impl fmt::Display for AsyncStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AsyncStyle::ValueWrap => "value-wrap",
            AsyncStyle::AwaitWrap => "await-wrap",
            AsyncStyle::Auto => "auto",
        };
        f.write_str(s)
    }
}

/// Outcome details of a return-type wrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsyncWrapReport {
    pub method: String,
    pub original_return_type: String,
    pub return_statements_modified: usize,
    /// Method header after the rewrite, up to the body.
    pub new_signature: String,
    pub already_async: bool,
}
