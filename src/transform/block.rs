use crate::edit::Edit;
use crate::syntax::{SyntaxNode, SyntaxTree};
use crate::transform::errors::{require, require_identifier, InputError, TransformError};
use crate::transform::operation::{EditOperation, OperationOutput};
use crate::transform::wrap::{
    find_method, has_multiline_literal, indent_tail, indent_unit, terminated,
};
use serde::Deserialize;
use std::fmt;

const DEFAULT_HANDLER: &str = "throw;";

fn default_item_type() -> String {
    "var".to_string()
}

/// Which top-level statements of a method body to wrap.
///
/// The `between-*` selectors take the last anchor matching `first` and the
/// next anchor matching `second` after it; the anchors themselves stay
/// outside the selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "by", rename_all = "kebab-case")]
pub enum BlockSelector {
    /// Anchors are local declarations whose type contains the given text.
    BetweenTypes { first: String, second: String },
    /// Anchors are statements that mention the given identifier.
    BetweenNames { first: String, second: String },
    /// 0-based, both ends inclusive.
    BetweenIndices { start: usize, end: usize },
    /// Every statement mentioning the identifier; each contiguous run is
    /// wrapped on its own.
    ContainingIdentifier { identifier: String },
    /// Statements lying between a comment containing `start` and the next
    /// comment containing `end`.
    BetweenComments { start: String, end: String },
}

impl fmt::Display for BlockSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSelector::BetweenTypes { first, second } => {
                write!(f, "between types '{first}' and '{second}'")
            }
            BlockSelector::BetweenNames { first, second } => {
                write!(f, "between '{first}' and '{second}'")
            }
            BlockSelector::BetweenIndices { start, end } => {
                write!(f, "at indices {start}..={end}")
            }
            BlockSelector::ContainingIdentifier { identifier } => {
                write!(f, "mentioning '{identifier}'")
            }
            BlockSelector::BetweenComments { start, end } => {
                write!(f, "between comments '{start}' and '{end}'")
            }
        }
    }
}

impl BlockSelector {
    fn validate(&self) -> Result<(), InputError> {
        match self {
            BlockSelector::BetweenTypes { first, second } => {
                require("first type", first)?;
                require("second type", second)
            }
            BlockSelector::BetweenNames { first, second } => {
                require_identifier("first name", first)?;
                require_identifier("second name", second)
            }
            BlockSelector::BetweenIndices { start, end } if start > end => {
                Err(InputError::InvalidRange {
                    start: *start,
                    end: *end,
                })
            }
            BlockSelector::BetweenIndices { .. } => Ok(()),
            BlockSelector::ContainingIdentifier { identifier } => {
                require_identifier("identifier", identifier)
            }
            BlockSelector::BetweenComments { start, end } => {
                require("start comment", start)?;
                require("end comment", end)
            }
        }
    }

    /// Indices into `statements` of the selected statements, ascending.
    fn select(&self, block: SyntaxNode<'_>, statements: &[SyntaxNode<'_>]) -> Vec<usize> {
        match self {
            BlockSelector::BetweenTypes { first, second } => {
                let declares = |s: &SyntaxNode<'_>, ty: &str| {
                    s.ts_kind() == "local_declaration_statement"
                        && s.declared_type().is_some_and(|t| t.contains(ty))
                };
                between(statements, |s| declares(s, first.as_str()), |s| {
                    declares(s, second.as_str())
                })
            }
            BlockSelector::BetweenNames { first, second } => {
                between(statements, |s| mentions(*s, first), |s| mentions(*s, second))
            }
            BlockSelector::BetweenIndices { start, end } => {
                if *end < statements.len() {
                    (*start..=*end).collect()
                } else {
                    Vec::new()
                }
            }
            BlockSelector::ContainingIdentifier { identifier } => statements
                .iter()
                .enumerate()
                .filter(|(_, s)| mentions(**s, identifier))
                .map(|(i, _)| i)
                .collect(),
            BlockSelector::BetweenComments { start, end } => {
                let comments: Vec<SyntaxNode<'_>> = block
                    .descendants()
                    .into_iter()
                    .filter(|n| n.ts_kind() == "comment")
                    .collect();
                let Some(open) = comments.iter().find(|c| c.text().contains(start.as_str()))
                else {
                    return Vec::new();
                };
                let Some(close) = comments.iter().find(|c| {
                    c.byte_start() >= open.byte_end() && c.text().contains(end.as_str())
                }) else {
                    return Vec::new();
                };
                statements
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| {
                        s.byte_start() >= open.byte_end() && s.byte_end() <= close.byte_start()
                    })
                    .map(|(i, _)| i)
                    .collect()
            }
        }
    }
}

/// Statements strictly between the last `is_first` anchor and the next
/// `is_second` anchor after it.
fn between<'t>(
    statements: &[SyntaxNode<'t>],
    is_first: impl Fn(&SyntaxNode<'t>) -> bool,
    is_second: impl Fn(&SyntaxNode<'t>) -> bool,
) -> Vec<usize> {
    let Some(open) = statements.iter().rposition(&is_first) else {
        return Vec::new();
    };
    let Some(close) = statements[open + 1..]
        .iter()
        .position(&is_second)
        .map(|p| p + open + 1)
    else {
        return Vec::new();
    };
    (open + 1..close).collect()
}

/// Whether an identifier token spelled `name` occurs inside `statement`.
fn mentions(statement: SyntaxNode<'_>, name: &str) -> bool {
    statement
        .descendants()
        .into_iter()
        .any(|n| n.ts_kind() == "identifier" && n.text() == name)
}

/// Control-flow construct placed around the selected statements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "primitive", rename_all = "kebab-case")]
pub enum ControlFlow {
    If {
        condition: String,
    },
    #[serde(rename = "foreach")]
    ForEach {
        #[serde(default = "default_item_type")]
        item_type: String,
        item: String,
        collection: String,
    },
    While {
        condition: String,
    },
    /// Each part may be empty, as in `for (;;)`.
    For {
        #[serde(default)]
        initializer: String,
        #[serde(default)]
        condition: String,
        #[serde(default)]
        update: String,
    },
    DoWhile {
        condition: String,
    },
    /// Without a handler the catch block re-throws.
    TryCatch {
        #[serde(default)]
        handler: Option<String>,
    },
    Lock {
        target: String,
    },
    Using {
        resource: String,
    },
    Checked,
    Unchecked,
}

impl fmt::Display for ControlFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlFlow::If { .. } => "if",
            ControlFlow::ForEach { .. } => "foreach",
            ControlFlow::While { .. } => "while",
            ControlFlow::For { .. } => "for",
            ControlFlow::DoWhile { .. } => "do-while",
            ControlFlow::TryCatch { .. } => "try-catch",
            ControlFlow::Lock { .. } => "lock",
            ControlFlow::Using { .. } => "using",
            ControlFlow::Checked => "checked",
            ControlFlow::Unchecked => "unchecked",
        };
        f.write_str(s)
    }
}

impl ControlFlow {
    fn validate(&self) -> Result<(), InputError> {
        match self {
            ControlFlow::If { condition }
            | ControlFlow::While { condition }
            | ControlFlow::DoWhile { condition } => require("condition", condition),
            ControlFlow::ForEach {
                item_type,
                item,
                collection,
            } => {
                require("item type", item_type)?;
                require_identifier("item name", item)?;
                require("collection", collection)
            }
            ControlFlow::Lock { target } => require("lock target", target),
            ControlFlow::Using { resource } => require("resource", resource),
            ControlFlow::For { .. }
            | ControlFlow::TryCatch { .. }
            | ControlFlow::Checked
            | ControlFlow::Unchecked => Ok(()),
        }
    }

    /// Keyword line in front of the block, `None` for `do` and `try`.
    fn header(&self) -> Option<String> {
        let header = match self {
            ControlFlow::If { condition } => format!("if ({})", condition.trim()),
            ControlFlow::ForEach {
                item_type,
                item,
                collection,
            } => format!(
                "foreach ({} {} in {})",
                item_type.trim(),
                item.trim(),
                collection.trim()
            ),
            ControlFlow::While { condition } => format!("while ({})", condition.trim()),
            ControlFlow::For {
                initializer,
                condition,
                update,
            } => format!(
                "for ({}; {}; {})",
                initializer.trim(),
                condition.trim(),
                update.trim()
            )
            .replace(" ;", ";")
            .replace("; )", ";)"),
            ControlFlow::Lock { target } => format!("lock ({})", target.trim()),
            ControlFlow::Using { resource } => format!("using ({})", resource.trim()),
            ControlFlow::Checked => "checked".to_string(),
            ControlFlow::Unchecked => "unchecked".to_string(),
            ControlFlow::DoWhile { .. } | ControlFlow::TryCatch { .. } => return None,
        };
        Some(header)
    }
}

/// Layout of one wrapped run: where it starts and how it is indented.
struct Layout<'a> {
    indent: &'a str,
    unit: &'static str,
    inline: bool,
}

impl Layout<'_> {
    fn separator(&self) -> String {
        if self.inline {
            " ".to_string()
        } else {
            format!("\n{}", self.indent)
        }
    }

    /// `body` is original source whose later lines already carry `indent`.
    fn source_block(&self, body: &str, keep_lines: bool) -> String {
        if self.inline {
            return format!("{{ {body} }}");
        }
        let body = if keep_lines {
            body.to_string()
        } else {
            indent_tail(body, self.unit)
        };
        format!("{{\n{}{}{body}\n{}}}", self.indent, self.unit, self.indent)
    }

    /// `code` is new text with no indentation of its own.
    fn fresh_block(&self, code: &str) -> String {
        if self.inline {
            return format!("{{ {code} }}");
        }
        let inner = format!("{}{}", self.indent, self.unit);
        format!(
            "{{\n{inner}{}\n{}}}",
            indent_tail(code, &inner),
            self.indent
        )
    }
}

/// Wraps a selection of statements in the first method with a given name
/// inside a control-flow construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockWrapOperation {
    method: String,
    selector: BlockSelector,
    primitive: ControlFlow,
}

impl BlockWrapOperation {
    pub fn new(
        method: &str,
        selector: BlockSelector,
        primitive: ControlFlow,
    ) -> Result<Self, InputError> {
        require_identifier("method name", method)?;
        selector.validate()?;
        primitive.validate()?;
        Ok(Self {
            method: method.to_string(),
            selector,
            primitive,
        })
    }

    fn render(&self, body: &str, layout: &Layout<'_>, keep_lines: bool) -> String {
        let sep = layout.separator();
        let block = layout.source_block(body, keep_lines);
        match &self.primitive {
            ControlFlow::DoWhile { condition } => {
                format!("do{sep}{block}{sep}while ({});", condition.trim())
            }
            ControlFlow::TryCatch { handler } => {
                let handler = match handler {
                    Some(h) if !h.trim().is_empty() => terminated(h),
                    _ => DEFAULT_HANDLER.to_string(),
                };
                let catch = layout.fresh_block(&handler);
                format!("try{sep}{block}{sep}catch (Exception ex){sep}{catch}")
            }
            other => {
                let header = other.header().unwrap_or_default();
                format!("{header}{sep}{block}")
            }
        }
    }
}

/// Maximal runs of consecutive indices.
fn runs(indices: &[usize]) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::new();
    for &i in indices {
        match out.last_mut() {
            Some((_, last)) if *last + 1 == i => *last = i,
            _ => out.push((i, i)),
        }
    }
    out
}

impl EditOperation for BlockWrapOperation {
    fn description(&self) -> String {
        format!(
            "Wrap statements {} in method '{}' with {}",
            self.selector, self.method, self.primitive
        )
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

        let statements: Vec<SyntaxNode<'_>> = block
            .named_children()
            .into_iter()
            .filter(|s| !s.raw().is_extra())
            .collect();
        let selected = self.selector.select(block, &statements);
        if selected.is_empty() {
            return Err(TransformError::EmptySelection {
                method: self.method.clone(),
                selector: self.selector.to_string(),
            });
        }

        let mut edits = Vec::new();
        for (first, last) in runs(&selected) {
            let (head, tail) = (statements[first], statements[last]);
            let indent = head.indentation();
            let layout = Layout {
                indent,
                unit: indent_unit(indent),
                inline: head.line() == block.line(),
            };
            let keep_lines = statements[first..=last]
                .iter()
                .any(|s| has_multiline_literal(*s));
            let body = &text[head.byte_start()..tail.byte_end()];
            edits.push(Edit::new(
                head.byte_start(),
                tail.byte_end(),
                self.render(body, &layout, keep_lines),
                body,
            ));
        }

        let new_text = Edit::apply_all(text, edits)?;
        Ok(OperationOutput::new(
            new_text,
            format!(
                "Wrapped {} statement(s) in method '{}' with {}",
                selected.len(),
                self.method,
                self.primitive
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROCESS: &str = "class Service\n{\n    public void Process()\n    {\n        List<string> items = new List<string>();\n        var x = items.Count;\n        var y = items.First();\n        string result = \"done\";\n    }\n}\n";

    fn wrap(selector: BlockSelector, primitive: ControlFlow, text: &str) -> OperationOutput {
        BlockWrapOperation::new("Process", selector, primitive)
            .unwrap()
            .execute(text)
            .unwrap()
    }

    fn between_types() -> BlockSelector {
        BlockSelector::BetweenTypes {
            first: "List".into(),
            second: "string".into(),
        }
    }

    #[test]
    fn if_around_statements_between_types() {
        let out = wrap(
            between_types(),
            ControlFlow::If {
                condition: "items.Count > 0".into(),
            },
            PROCESS,
        );

        let expected = "class Service\n{\n    public void Process()\n    {\n        List<string> items = new List<string>();\n        if (items.Count > 0)\n        {\n            var x = items.Count;\n            var y = items.First();\n        }\n        string result = \"done\";\n    }\n}\n";
        assert_eq!(out.text, expected);
        assert_eq!(
            out.change,
            "Wrapped 2 statement(s) in method 'Process' with if"
        );
        assert!(SyntaxTree::parse(&out.text).is_ok());
    }

    #[test]
    fn indices_with_try_catch() {
        let out = wrap(
            BlockSelector::BetweenIndices { start: 1, end: 2 },
            ControlFlow::TryCatch {
                handler: Some("Log(ex)".into()),
            },
            PROCESS,
        );
        assert!(out.text.contains(
            "        try\n        {\n            var x = items.Count;\n            var y = items.First();\n        }\n        catch (Exception ex)\n        {\n            Log(ex);\n        }\n        string result"
        ));
    }

    #[test]
    fn every_primitive_produces_valid_code() {
        let primitives = vec![
            ControlFlow::If { condition: "ready".into() },
            ControlFlow::ForEach {
                item_type: default_item_type(),
                item: "item".into(),
                collection: "items".into(),
            },
            ControlFlow::While { condition: "busy".into() },
            ControlFlow::For {
                initializer: "int i = 0".into(),
                condition: "i < 3".into(),
                update: "i++".into(),
            },
            ControlFlow::DoWhile { condition: "again".into() },
            ControlFlow::TryCatch { handler: None },
            ControlFlow::Lock { target: "_gate".into() },
            ControlFlow::Using {
                resource: "var scope = Begin()".into(),
            },
            ControlFlow::Checked,
            ControlFlow::Unchecked,
        ];
        for primitive in primitives {
            let name = primitive.to_string();
            let out = wrap(between_types(), primitive, PROCESS);
            assert!(SyntaxTree::parse(&out.text).is_ok(), "{name}: {}", out.text);
            assert!(out.text.contains("List<string> items"));
            assert!(out.text.contains("string result = \"done\";"));
        }
    }

    #[test]
    fn do_while_and_for_layout() {
        let out = wrap(
            between_types(),
            ControlFlow::DoWhile {
                condition: "retry".into(),
            },
            PROCESS,
        );
        assert!(out.text.contains("        do\n        {\n"));
        assert!(out.text.contains("        }\n        while (retry);\n"));

        let forever = wrap(
            between_types(),
            ControlFlow::For {
                initializer: String::new(),
                condition: String::new(),
                update: String::new(),
            },
            PROCESS,
        );
        assert!(forever.text.contains("        for (;;)\n"));
    }

    #[test]
    fn between_names_selects_inner_statements() {
        let source = "class A { void Execute() { var firstName = \"John\"; var middle = 42; var middle2 = 43; var lastName = \"Doe\"; } }";
        let op = BlockWrapOperation::new(
            "Execute",
            BlockSelector::BetweenNames {
                first: "firstName".into(),
                second: "lastName".into(),
            },
            ControlFlow::Checked,
        )
        .unwrap();
        let out = op.execute(source).unwrap();
        assert_eq!(
            out.text,
            "class A { void Execute() { var firstName = \"John\"; checked { var middle = 42; var middle2 = 43; } var lastName = \"Doe\"; } }"
        );
    }

    #[test]
    fn identifier_runs_wrapped_separately() {
        let source = "class A\n{\n    void Work()\n    {\n        var data = 1;\n        Console.WriteLine(data);\n        var other = 2;\n        data = 3;\n    }\n}\n";
        let op = BlockWrapOperation::new(
            "Work",
            BlockSelector::ContainingIdentifier {
                identifier: "data".into(),
            },
            ControlFlow::Lock {
                target: "_sync".into(),
            },
        )
        .unwrap();
        let out = op.execute(source).unwrap();

        assert_eq!(out.text.matches("lock (_sync)").count(), 2);
        assert!(out.text.contains("        }\n        var other = 2;\n        lock (_sync)\n"));
        assert_eq!(out.change, "Wrapped 3 statement(s) in method 'Work' with lock");
    }

    #[test]
    fn between_comments() {
        let source = "class A\n{\n    void Sync()\n    {\n        Prepare();\n        // begin critical\n        Write(a);\n        Write(b);\n        // end critical\n        Done();\n    }\n}\n";
        let op = BlockWrapOperation::new(
            "Sync",
            BlockSelector::BetweenComments {
                start: "begin critical".into(),
                end: "end critical".into(),
            },
            ControlFlow::Lock {
                target: "this".into(),
            },
        )
        .unwrap();
        let out = op.execute(source).unwrap();
        assert!(out.text.contains(
            "        // begin critical\n        lock (this)\n        {\n            Write(a);\n            Write(b);\n        }\n        // end critical\n"
        ));
    }

    #[test]
    fn empty_selection_is_an_error() {
        let op = BlockWrapOperation::new(
            "Process",
            BlockSelector::BetweenIndices { start: 2, end: 9 },
            ControlFlow::Checked,
        )
        .unwrap();
        assert_eq!(
            op.execute(PROCESS).unwrap_err(),
            TransformError::EmptySelection {
                method: "Process".into(),
                selector: "at indices 2..=9".into(),
            }
        );

        let missing = BlockWrapOperation::new("Nope", between_types(), ControlFlow::Checked).unwrap();
        assert!(matches!(
            missing.execute(PROCESS),
            Err(TransformError::NotFound { .. })
        ));
    }

    #[test]
    fn invalid_arguments_rejected() {
        assert_eq!(
            BlockWrapOperation::new(
                "Process",
                BlockSelector::BetweenIndices { start: 3, end: 1 },
                ControlFlow::Checked,
            )
            .unwrap_err(),
            InputError::InvalidRange { start: 3, end: 1 }
        );
        assert_eq!(
            BlockWrapOperation::new(
                "Process",
                between_types(),
                ControlFlow::If {
                    condition: " ".into()
                },
            )
            .unwrap_err(),
            InputError::Empty {
                argument: "condition"
            }
        );
    }

    #[test]
    fn runs_group_consecutive_indices() {
        assert_eq!(runs(&[0, 1, 3, 5, 6, 7]), vec![(0, 1), (3, 3), (5, 7)]);
        assert!(runs(&[]).is_empty());
    }

    #[test]
    fn config_forms_deserialize() {
        let selector: BlockSelector =
            serde_json::from_str(r#"{"by": "between-indices", "start": 0, "end": 2}"#).unwrap();
        assert_eq!(selector, BlockSelector::BetweenIndices { start: 0, end: 2 });

        let primitive: ControlFlow = serde_json::from_str(
            r#"{"primitive": "foreach", "item": "line", "collection": "lines"}"#,
        )
        .unwrap();
        assert_eq!(
            primitive,
            ControlFlow::ForEach {
                item_type: "var".into(),
                item: "line".into(),
                collection: "lines".into(),
            }
        );
        let checked: ControlFlow = serde_json::from_str(r#"{"primitive": "checked"}"#).unwrap();
        assert_eq!(checked, ControlFlow::Checked);
    }
}
