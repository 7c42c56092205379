use crate::edit::Edit;
use crate::syntax::{SyntaxNode, SyntaxTree};
use crate::transform::errors::{require, require_identifier, InputError, TransformError};
use crate::transform::operation::{EditOperation, OperationOutput, WrapKind};

const DEFAULT_HANDLER: &str = "throw;";

/// Wraps the first method with a given name in try/catch, or prepends a
/// logging or validation statement to its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapOperation {
    kind: WrapKind,
    method: String,
    code: String,
}

impl WrapOperation {
    /// `handler` defaults to re-throwing.
    pub fn try_catch(method: &str, handler: Option<&str>) -> Result<Self, InputError> {
        require_identifier("method name", method)?;
        let handler = match handler {
            Some(h) if !h.trim().is_empty() => h.to_string(),
            _ => DEFAULT_HANDLER.to_string(),
        };
        Ok(Self {
            kind: WrapKind::TryCatch,
            method: method.to_string(),
            code: handler,
        })
    }

    pub fn logging(method: &str, code: &str) -> Result<Self, InputError> {
        Self::prepend(WrapKind::Logging, method, code, "logging code")
    }

    pub fn validation(method: &str, code: &str) -> Result<Self, InputError> {
        Self::prepend(WrapKind::Validation, method, code, "validation code")
    }

    /// Build from a kind; `code` is the handler for try/catch.
    pub fn new(kind: WrapKind, method: &str, code: &str) -> Result<Self, InputError> {
        match kind {
            WrapKind::TryCatch => Self::try_catch(method, Some(code)),
            WrapKind::Logging => Self::logging(method, code),
            WrapKind::Validation => Self::validation(method, code),
        }
    }

    fn prepend(
        kind: WrapKind,
        method: &str,
        code: &str,
        argument: &'static str,
    ) -> Result<Self, InputError> {
        require_identifier("method name", method)?;
        require(argument, code)?;
        Ok(Self {
            kind,
            method: method.to_string(),
            code: code.to_string(),
        })
    }
}

/// Statement text with a trailing `;` unless it already ends a statement or block.
pub(crate) fn terminated(code: &str) -> String {
    let code = code.trim();
    if code.ends_with(';') || code.ends_with('}') {
        code.to_string()
    } else {
        format!("{code};")
    }
}

/// Prefix every line after the first with `indent`.
pub(crate) fn indent_tail(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.trim().is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}

pub(crate) fn indent_unit(indent: &str) -> &'static str {
    if indent.contains('\t') {
        "\t"
    } else {
        "    "
    }
}

/// Multi-line string literals must not be re-indented.
pub(crate) fn has_multiline_literal(block: SyntaxNode<'_>) -> bool {
    block.descendants().into_iter().any(|n| {
        matches!(
            n.ts_kind(),
            "verbatim_string_literal" | "raw_string_literal" | "interpolated_string_expression"
        ) && n.text().contains('\n')
    })
}

/// First `method_declaration` named `name`, in document order.
pub(crate) fn find_method<'t>(tree: &'t SyntaxTree, name: &str) -> Option<SyntaxNode<'t>> {
    tree.root()
        .descendants()
        .into_iter()
        .find(|n| n.ts_kind() == "method_declaration" && n.name() == Some(name))
}

impl WrapOperation {
    fn wrap_try_catch(&self, method: SyntaxNode<'_>, block: SyntaxNode<'_>) -> Edit {
        let outer = method.indentation();
        let unit = indent_unit(outer);
        let inner = format!("{outer}{unit}");
        let handler_indent = format!("{inner}{unit}");

        let body = if has_multiline_literal(block) {
            block.text().to_string()
        } else {
            indent_tail(block.text(), unit)
        };
        let handler = indent_tail(&terminated(&self.code), &handler_indent);

        let new_block = format!(
            "{{\n{inner}try\n{inner}{body}\n{inner}catch (Exception ex)\n{inner}{{\n{handler_indent}{handler}\n{inner}}}\n{outer}}}"
        );
        Edit::new(block.byte_start(), block.byte_end(), new_block, block.text())
    }

    fn prepend_statement(&self, method: SyntaxNode<'_>, block: SyntaxNode<'_>) -> Edit {
        let outer = method.indentation();
        let first = block
            .named_children()
            .into_iter()
            .find(|c| c.ts_kind() != "comment");
        let indent = match first {
            Some(stmt) if stmt.line() != block.line() => stmt.indentation().to_string(),
            _ => format!("{outer}{}", indent_unit(outer)),
        };

        let statement = indent_tail(&terminated(&self.code), &indent);
        // Insert right after the opening brace
        Edit::insert(block.byte_start() + 1, format!("\n{indent}{statement}"))
    }
}

impl EditOperation for WrapOperation {
    fn description(&self) -> String {
        format!("Wrap method '{}' with {}", self.method, self.kind)
    }

    fn execute(&self, text: &str) -> Result<OperationOutput, TransformError> {
        let tree = SyntaxTree::parse(text)?;
        let method = find_method(&tree, &self.method).ok_or_else(|| TransformError::NotFound {
            kind: "method".to_string(),
            name: self.method.clone(),
        })?;
        let block = method
            .block_body()
            .ok_or_else(|| TransformError::NoBlockBody(self.method.clone()))?;

        let edit = match self.kind {
            WrapKind::TryCatch => self.wrap_try_catch(method, block),
            WrapKind::Logging | WrapKind::Validation => self.prepend_statement(method, block),
        };
        let new_text = edit.apply_to(text)?;

        Ok(OperationOutput::new(
            new_text,
            format!("Wrapped method '{}' with {}", self.method, self.kind),
        ))
    }
}
