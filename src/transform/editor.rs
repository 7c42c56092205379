use crate::observer::{self, Observer};
use crate::syntax::validate_rewrite;
use crate::transform::async_result::AsyncReturnOperation;
use crate::transform::block::{BlockSelector, BlockWrapOperation, ControlFlow};
use crate::transform::errors::{InputError, TransformError};
use crate::transform::operation::{
    AsyncStyle, AsyncWrapReport, EditOperation, OperationOutput, RenameKind,
};
use crate::transform::rename::RenameOperation;
use crate::transform::replace::ReplaceOperation;
use crate::transform::wrap::WrapOperation;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorOptions {
    /// Fail an operation whose output has syntax errors its input did not.
    pub reject_syntax_errors: bool,
}

/// Result of [`CodeEditor::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        text: String,
        change_log: Vec<String>,
    },
    Failure {
        /// Text as of the last successful operation.
        text: String,
        failing_operation: String,
        error: TransformError,
        /// Changes committed before the failure.
        change_log: Vec<String>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn text(&self) -> &str {
        match self {
            Outcome::Success { text, .. } | Outcome::Failure { text, .. } => text,
        }
    }

    pub fn change_log(&self) -> &[String] {
        match self {
            Outcome::Success { change_log, .. } | Outcome::Failure { change_log, .. } => {
                change_log
            }
        }
    }

    /// `"Operation '<description>' failed: <error>"` for failures.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Failure {
                failing_operation,
                error,
                ..
            } => Some(format!("Operation '{failing_operation}' failed: {error}")),
        }
    }
}

/// Ordered pipeline of edit operations over one file's text.
///
/// ```
/// use csharp_refactor::transform::CodeEditor;
///
/// let mut editor = CodeEditor::new("class A { void Go() { Go(); } }");
/// editor.rename_method("Go", "Run").unwrap();
/// let outcome = editor.apply();
/// assert_eq!(outcome.text(), "class A { void Run() { Run(); } }");
/// ```
pub struct CodeEditor {
    original: String,
    current: String,
    queue: Vec<Box<dyn EditOperation>>,
    change_log: Vec<String>,
    async_reports: Vec<AsyncWrapReport>,
    options: EditorOptions,
    observer: Arc<dyn Observer>,
}

impl CodeEditor {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            current: text.clone(),
            original: text,
            queue: Vec::new(),
            change_log: Vec::new(),
            async_reports: Vec::new(),
            options: EditorOptions::default(),
            observer: observer::null(),
        }
    }

    pub fn with_options(mut self, options: EditorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn add_operation(&mut self, operation: Box<dyn EditOperation>) -> &mut Self {
        self.observer
            .on_debug(&format!("Queued: {}", operation.description()));
        self.queue.push(operation);
        self
    }

    pub fn rename(
        &mut self,
        kind: RenameKind,
        old_name: &str,
        new_name: &str,
    ) -> Result<&mut Self, InputError> {
        let op = RenameOperation::new(kind, old_name, new_name)?;
        Ok(self.add_operation(Box::new(op)))
    }

    pub fn rename_method(&mut self, old_name: &str, new_name: &str) -> Result<&mut Self, InputError> {
        self.rename(RenameKind::Method, old_name, new_name)
    }

    pub fn rename_class(&mut self, old_name: &str, new_name: &str) -> Result<&mut Self, InputError> {
        self.rename(RenameKind::Class, old_name, new_name)
    }

    pub fn rename_variable(
        &mut self,
        old_name: &str,
        new_name: &str,
    ) -> Result<&mut Self, InputError> {
        self.rename(RenameKind::Variable, old_name, new_name)
    }

    pub fn rename_property(
        &mut self,
        old_name: &str,
        new_name: &str,
    ) -> Result<&mut Self, InputError> {
        self.rename(RenameKind::Property, old_name, new_name)
    }

    /// Without a handler the catch block re-throws.
    pub fn wrap_with_try_catch(
        &mut self,
        method: &str,
        handler: Option<&str>,
    ) -> Result<&mut Self, InputError> {
        let op = WrapOperation::try_catch(method, handler)?;
        Ok(self.add_operation(Box::new(op)))
    }

    pub fn wrap_with_logging(&mut self, method: &str, code: &str) -> Result<&mut Self, InputError> {
        let op = WrapOperation::logging(method, code)?;
        Ok(self.add_operation(Box::new(op)))
    }

    pub fn wrap_with_validation(
        &mut self,
        method: &str,
        code: &str,
    ) -> Result<&mut Self, InputError> {
        let op = WrapOperation::validation(method, code)?;
        Ok(self.add_operation(Box::new(op)))
    }

    /// Wrap the statements `selector` picks in `method` with `primitive`.
    pub fn wrap_block(
        &mut self,
        method: &str,
        selector: BlockSelector,
        primitive: ControlFlow,
    ) -> Result<&mut Self, InputError> {
        let op = BlockWrapOperation::new(method, selector, primitive)?;
        Ok(self.add_operation(Box::new(op)))
    }

    pub fn replace(&mut self, old: &str, new: &str) -> Result<&mut Self, InputError> {
        let op = ReplaceOperation::new(old, new)?;
        Ok(self.add_operation(Box::new(op)))
    }

    pub fn wrap_returns_in_async_result(
        &mut self,
        method: &str,
        style: AsyncStyle,
    ) -> Result<&mut Self, InputError> {
        let op = AsyncReturnOperation::new(method, style)?;
        Ok(self.add_operation(Box::new(op)))
    }

    fn run(
        &self,
        operation: &dyn EditOperation,
        text: &str,
    ) -> Result<OperationOutput, TransformError> {
        let output = operation.execute(text)?;
        if self.options.reject_syntax_errors {
            validate_rewrite(text, &output.text).map_err(TransformError::SyntaxIntroduced)?;
        }
        Ok(output)
    }

    /// Run every queued operation in order against the current text.
    ///
    /// The queue is drained. Execution stops at the first failure; the text
    /// committed by earlier operations is kept as the editor's current text.
    pub fn apply(&mut self) -> Outcome {
        let queue = std::mem::take(&mut self.queue);

        if queue.is_empty() {
            self.observer.on_info("No operations to apply");
            return Outcome::Success {
                text: self.current.clone(),
                change_log: vec!["No operations to apply".to_string()],
            };
        }

        self.observer
            .on_info(&format!("Applying {} operation(s)", queue.len()));

        for operation in queue {
            let description = operation.description();
            self.observer.on_debug(&format!("Executing: {description}"));

            match self.run(operation.as_ref(), &self.current) {
                Ok(output) => {
                    self.observer
                        .on_transformation(&description, &self.current, &output.text);
                    self.current = output.text;
                    self.change_log.push(output.change);
                    if let Some(report) = output.async_report {
                        self.async_reports.push(report);
                    }
                }
                Err(error) => {
                    self.observer.on_error(
                        &format!("Operation '{description}' failed"),
                        Some(&error),
                    );
                    return Outcome::Failure {
                        text: self.current.clone(),
                        failing_operation: description,
                        error,
                        change_log: self.change_log.clone(),
                    };
                }
            }
        }

        Outcome::Success {
            text: self.current.clone(),
            change_log: self.change_log.clone(),
        }
    }

    pub fn current_text(&self) -> &str {
        &self.current
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    pub fn change_log(&self) -> &[String] {
        &self.change_log
    }

    pub fn pending_operations(&self) -> Vec<String> {
        self.queue.iter().map(|op| op.description()).collect()
    }

    pub fn async_reports(&self) -> &[AsyncWrapReport] {
        &self.async_reports
    }

    /// Drop queued operations. Applied edits and the change log are kept.
    pub fn clear(&mut self) -> &mut Self {
        self.queue.clear();
        self
    }

    /// Restore the original text and forget every edit.
    pub fn reset(&mut self) -> &mut Self {
        self.current = self.original.clone();
        self.queue.clear();
        self.change_log.clear();
        self.async_reports.clear();
        self
    }
}

impl std::fmt::Debug for CodeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeEditor")
            .field("pending", &self.pending_operations())
            .field("change_log", &self.change_log)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::MemoryObserver;

    const SOURCE: &str = "class Calc\n{\n    int Add(int a, int b)\n    {\n        return a + b;\n    }\n}\n";

    #[test]
    fn operations_run_in_order() {
        let mut editor = CodeEditor::new(SOURCE);
        editor
            .rename_method("Add", "Sum")
            .unwrap()
            .wrap_with_logging("Sum", "Log(\"sum\")")
            .unwrap();

        let outcome = editor.apply();

        assert!(outcome.is_success());
        assert!(outcome.text().contains("int Sum(int a, int b)"));
        assert!(outcome.text().contains("{\n        Log(\"sum\");\n        return a + b;"));
        assert_eq!(
            outcome.change_log(),
            [
                "Renamed method 'Add' to 'Sum'",
                "Wrapped method 'Sum' with logging"
            ]
        );
        assert!(editor.pending_operations().is_empty());
    }

    #[test]
    fn first_failure_halts_pipeline() {
        let mut editor = CodeEditor::new(SOURCE);
        editor
            .rename_method("Add", "Sum")
            .unwrap()
            .replace("NotThere", "X")
            .unwrap()
            .rename_class("Calc", "Calculator")
            .unwrap();

        let outcome = editor.apply();

        match &outcome {
            Outcome::Failure {
                text,
                failing_operation,
                error,
                change_log,
            } => {
                assert!(text.contains("int Sum("));
                assert!(text.contains("class Calc\n"));
                assert_eq!(failing_operation, "Replace code snippet");
                assert!(matches!(error, TransformError::SnippetNotFound { .. }));
                assert_eq!(change_log, &vec!["Renamed method 'Add' to 'Sum'".to_string()]);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(
            outcome.error_message().unwrap(),
            "Operation 'Replace code snippet' failed: Code snippet not found"
        );
        assert_eq!(editor.current_text(), outcome.text());
    }

    #[test]
    fn replace_missing_leaves_text_unchanged() {
        let mut editor = CodeEditor::new(SOURCE);
        editor.replace("NotFound", "X").unwrap();
        let outcome = editor.apply();

        assert!(!outcome.is_success());
        assert_eq!(outcome.text(), SOURCE);
    }

    #[test]
    fn empty_queue_reports_no_operations() {
        let mut editor = CodeEditor::new(SOURCE);
        let outcome = editor.apply();
        assert!(outcome.is_success());
        assert_eq!(outcome.change_log(), ["No operations to apply"]);
        assert_eq!(outcome.text(), SOURCE);
    }

    #[test]
    fn input_errors_are_synchronous() {
        let mut editor = CodeEditor::new(SOURCE);
        assert!(editor.rename_method("", "X").is_err());
        assert!(editor.wrap_with_logging("Add", "").is_err());
        assert!(editor.replace("", "X").is_err());
        assert!(editor.pending_operations().is_empty());
    }

    #[test]
    fn malformed_input_fails_operation() {
        let mut editor = CodeEditor::new("class A { void M( }");
        editor.rename_method("M", "N").unwrap();
        let outcome = editor.apply();
        assert!(matches!(
            outcome,
            Outcome::Failure {
                error: TransformError::Parse(_),
                ..
            }
        ));
    }

    #[test]
    fn reset_restores_original() {
        let mut editor = CodeEditor::new(SOURCE);
        editor.rename_class("Calc", "Calculator").unwrap();
        editor.apply();
        assert_ne!(editor.current_text(), SOURCE);

        editor.reset();
        assert_eq!(editor.current_text(), SOURCE);
        assert!(editor.change_log().is_empty());
    }

    #[test]
    fn clear_drops_only_queued_operations() {
        let mut editor = CodeEditor::new(SOURCE);
        editor.rename_class("Calc", "Calculator").unwrap();
        editor.apply();
        editor.rename_method("Add", "Plus").unwrap();
        assert_eq!(editor.pending_operations().len(), 1);

        editor.clear();

        assert!(editor.pending_operations().is_empty());
        assert!(editor.current_text().contains("class Calculator"));
        assert_eq!(editor.change_log().len(), 1);
    }

    #[test]
    fn async_reports_are_collected() {
        let mut editor = CodeEditor::new(SOURCE);
        editor
            .wrap_returns_in_async_result("Add", AsyncStyle::ValueWrap)
            .unwrap();
        let outcome = editor.apply();

        assert!(outcome.is_success());
        assert!(outcome.text().contains("async Task<int> Add(int a, int b)"));
        assert!(outcome.text().contains("return Task.FromResult(a + b);"));
        assert_eq!(editor.async_reports().len(), 1);
        assert_eq!(editor.async_reports()[0].return_statements_modified, 1);
    }

    #[test]
    fn syntax_guard_rejects_broken_output() {
        let mut editor =
            CodeEditor::new(SOURCE).with_options(EditorOptions {
                reject_syntax_errors: true,
            });
        editor.replace("return a + b;", "return a +;").unwrap();
        let outcome = editor.apply();
        assert!(matches!(
            outcome,
            Outcome::Failure {
                error: TransformError::SyntaxIntroduced(_),
                ..
            }
        ));
        assert_eq!(editor.current_text(), SOURCE);
    }

    #[test]
    fn observer_sees_transformations_and_errors() {
        let obs = Arc::new(MemoryObserver::new());
        let mut editor = CodeEditor::new(SOURCE).with_observer(obs.clone());
        editor
            .rename_method("Add", "Sum")
            .unwrap()
            .replace("missing", "x")
            .unwrap();
        editor.apply();

        assert_eq!(obs.lines_with_prefix("TRANSFORMATION").len(), 1);
        assert_eq!(obs.lines_with_prefix("ERROR").len(), 1);
    }

    struct Upper;

    impl EditOperation for Upper {
        fn description(&self) -> String {
            "Uppercase".into()
        }

        fn execute(&self, text: &str) -> Result<OperationOutput, TransformError> {
            Ok(OperationOutput::new(text.to_uppercase(), "Uppercased"))
        }
    }

    #[test]
    fn custom_operations() {
        let mut editor = CodeEditor::new("abc");
        editor.add_operation(Box::new(Upper));
        assert_eq!(editor.apply().text(), "ABC");
        assert_eq!(editor.change_log(), ["Uppercased"]);
    }
}
