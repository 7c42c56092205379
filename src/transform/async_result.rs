use crate::edit::Edit;
use crate::syntax::node::is_nested_function;
use crate::syntax::{SyntaxNode, SyntaxTree};
use crate::transform::errors::{require_identifier, InputError, TransformError};
use crate::transform::operation::{AsyncStyle, AsyncWrapReport, EditOperation, OperationOutput};
use crate::transform::wrap::find_method;

/// Turns `T M()` into `async Task<T> M()` (or `void` into `async Task`) and
/// rewrites the method's own return statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncReturnOperation {
    method: String,
    style: AsyncStyle,
}

impl AsyncReturnOperation {
    pub fn new(method: &str, style: AsyncStyle) -> Result<Self, InputError> {
        require_identifier("method name", method)?;
        Ok(Self {
            method: method.to_string(),
            style,
        })
    }
}

/// Return statements that belong to `method` itself, skipping nested
/// local functions, lambdas and anonymous methods.
fn own_returns<'t>(method: SyntaxNode<'t>, body: SyntaxNode<'t>) -> Vec<SyntaxNode<'t>> {
    body.descendants()
        .into_iter()
        .filter(|n| n.ts_kind() == "return_statement")
        .filter(|ret| {
            ret.ancestors()
                .take_while(|a| *a != method)
                .all(|a| !is_nested_function(a.ts_kind()))
        })
        .collect()
}

/// Header text from the first modifier (or return type) up to the body.
fn header_span(method: SyntaxNode<'_>) -> (usize, usize) {
    let start = method
        .children()
        .into_iter()
        .find(|c| !matches!(c.ts_kind(), "attribute_list" | "comment"))
        .map(|c| c.byte_start())
        .unwrap_or_else(|| method.byte_start());
    let end = method
        .body()
        .map(|b| b.byte_start())
        .unwrap_or_else(|| method.byte_end());
    (start, end)
}

fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl AsyncReturnOperation {
    fn wrap_value(&self, expr: &str) -> String {
        match self.style {
            AsyncStyle::ValueWrap | AsyncStyle::Auto => format!("Task.FromResult({expr})"),
            AsyncStyle::AwaitWrap => format!("await Task.FromResult({expr})"),
        }
    }
}

impl EditOperation for AsyncReturnOperation {
    fn description(&self) -> String {
        format!(
            "Wrap returns of method '{}' in async Task ({})",
            self.method, self.style
        )
    }

    fn execute(&self, text: &str) -> Result<OperationOutput, TransformError> {
        let tree = SyntaxTree::parse(text)?;
        let method = find_method(&tree, &self.method).ok_or_else(|| TransformError::NotFound {
            kind: "method".to_string(),
            name: self.method.clone(),
        })?;
        let return_type = method.return_type_node().ok_or_else(|| TransformError::NotFound {
            kind: "return type of method".to_string(),
            name: self.method.clone(),
        })?;
        let original_return_type = return_type.text().to_string();
        let (header_start, header_end) = header_span(method);

        if method.has_modifier("async") {
            let report = AsyncWrapReport {
                method: self.method.clone(),
                original_return_type,
                return_statements_modified: 0,
                new_signature: squash_whitespace(&text[header_start..header_end]),
                already_async: true,
            };
            return Ok(OperationOutput {
                text: text.to_string(),
                change: format!("Method '{}' is already async; left unchanged", self.method),
                async_report: Some(report),
            });
        }

        let is_void = original_return_type == "void";
        let new_return_type = if is_void {
            "async Task".to_string()
        } else {
            format!("async Task<{original_return_type}>")
        };

        let mut edits = vec![Edit::new(
            return_type.byte_start(),
            return_type.byte_end(),
            new_return_type.clone(),
            return_type.text(),
        )];

        let mut modified = 0;
        if let Some(body) = method.block_body() {
            for ret in own_returns(method, body) {
                match ret.first_named_child() {
                    Some(expr) => {
                        edits.push(Edit::new(
                            expr.byte_start(),
                            expr.byte_end(),
                            self.wrap_value(expr.text()),
                            expr.text(),
                        ));
                        modified += 1;
                    }
                    None if is_void && self.style == AsyncStyle::Auto => {
                        edits.push(Edit::new(
                            ret.byte_start(),
                            ret.byte_end(),
                            "return Task.CompletedTask;",
                            ret.text(),
                        ));
                        modified += 1;
                    }
                    None => {}
                }
            }
        }

        let new_signature = {
            let mut header = text[header_start..header_end].to_string();
            header.replace_range(
                return_type.byte_start() - header_start..return_type.byte_end() - header_start,
                &new_return_type,
            );
            squash_whitespace(&header)
        };

        let new_text = Edit::apply_all(text, edits)?;
        let report = AsyncWrapReport {
            method: self.method.clone(),
            original_return_type: original_return_type.clone(),
            return_statements_modified: modified,
            new_signature,
            already_async: false,
        };

        Ok(OperationOutput {
            text: new_text,
            change: format!(
                "Changed method '{}' from {} to {} and wrapped {} return statement(s) ({})",
                self.method,
                original_return_type,
                new_return_type.trim_start_matches("async "),
                modified,
                self.style
            ),
            async_report: Some(report),
        })
    }
}
