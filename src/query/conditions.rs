//! Conditions guarding a statement: the `if`, loop and `switch` headers a
//! statement is nested under, outermost first.

use crate::query::context::NodeMatch;
use crate::syntax::{StatementKind, SyntaxNode, SyntaxTree};
use std::fmt;

/// One guard on the way from a method body down to a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionPath {
    pub kind: StatementKind,
    /// Condition text; loop headers for `for` and `foreach`, the switched
    /// value for `switch`.
    pub expression: String,
    /// 1 for the outermost guard.
    pub nesting_level: usize,
    /// The statement sits in the `else` branch of this `if`.
    pub negated: bool,
}

impl fmt::Display for ConditionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("not ")?;
        }
        write!(f, "{}({})", self.kind, self.expression)
    }
}

/// A statement of a method body with the guards leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementPath {
    pub statement: NodeMatch,
    pub conditions: Vec<ConditionPath>,
}

impl StatementPath {
    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Grammar kinds of the C# `statement` supertype.
pub(crate) fn is_statement_kind(kind: &str) -> bool {
    matches!(
        kind,
        "block"
            | "break_statement"
            | "checked_statement"
            | "continue_statement"
            | "do_statement"
            | "empty_statement"
            | "expression_statement"
            | "fixed_statement"
            | "for_statement"
            | "foreach_statement"
            | "goto_statement"
            | "if_statement"
            | "labeled_statement"
            | "local_declaration_statement"
            | "local_function_statement"
            | "lock_statement"
            | "return_statement"
            | "switch_statement"
            | "throw_statement"
            | "try_statement"
            | "unsafe_statement"
            | "using_statement"
            | "while_statement"
            | "yield_statement"
    )
}

fn field_text(node: SyntaxNode<'_>, field: &str) -> Option<String> {
    node.field(field).map(|n| n.text().to_string())
}

fn is_child(parent: SyntaxNode<'_>, field: &str, child: SyntaxNode<'_>) -> bool {
    parent.field(field).is_some_and(|f| f.id() == child.id())
}

/// The guard `ancestor` places on a node reached through its child `via`,
/// or `None` when `via` is a header part rather than a body.
fn guard(ancestor: SyntaxNode<'_>, via: SyntaxNode<'_>) -> Option<(StatementKind, String, bool)> {
    match ancestor.ts_kind() {
        "if_statement" => {
            let negated = if is_child(ancestor, "consequence", via) {
                false
            } else if is_child(ancestor, "alternative", via) {
                true
            } else {
                return None;
            };
            Some((StatementKind::If, field_text(ancestor, "condition")?, negated))
        }
        "for_statement" if is_child(ancestor, "body", via) => {
            let condition =
                field_text(ancestor, "condition").unwrap_or_else(|| "no condition".to_string());
            Some((StatementKind::For, condition, false))
        }
        "foreach_statement" if is_child(ancestor, "body", via) => {
            let left = field_text(ancestor, "left")?;
            let right = field_text(ancestor, "right")?;
            let header = match field_text(ancestor, "type") {
                Some(ty) => format!("{ty} {left} in {right}"),
                None => format!("{left} in {right}"),
            };
            Some((StatementKind::ForEach, header, false))
        }
        "while_statement" if is_child(ancestor, "body", via) => Some((
            StatementKind::While,
            field_text(ancestor, "condition")?,
            false,
        )),
        "do_statement" if is_child(ancestor, "body", via) => Some((
            StatementKind::DoWhile,
            field_text(ancestor, "condition")?,
            false,
        )),
        "switch_statement" if is_child(ancestor, "body", via) => Some((
            StatementKind::Switch,
            field_text(ancestor, "value")?,
            false,
        )),
        _ => None,
    }
}

/// Guards enclosing `statement`, outermost first.
pub fn conditions_leading_to(statement: SyntaxNode<'_>) -> Vec<ConditionPath> {
    let mut found = Vec::new();
    let mut via = statement;
    for ancestor in statement.ancestors() {
        if let Some(g) = guard(ancestor, via) {
            found.push(g);
        }
        via = ancestor;
    }

    found
        .into_iter()
        .rev()
        .enumerate()
        .map(|(i, (kind, expression, negated))| ConditionPath {
            kind,
            expression,
            nesting_level: i + 1,
            negated,
        })
        .collect()
}

/// Every statement in the body of `method`, blocks and local functions
/// excluded, paired with its guards.
pub fn conditional_paths(method: SyntaxNode<'_>) -> Vec<StatementPath> {
    let Some(body) = method.block_body() else {
        return Vec::new();
    };
    body.descendants()
        .into_iter()
        .skip(1)
        .filter(|n| is_statement_kind(n.ts_kind()))
        .filter(|n| !matches!(n.ts_kind(), "block" | "local_function_statement"))
        .map(|n| StatementPath {
            statement: NodeMatch::from_node(n),
            conditions: conditions_leading_to(n),
        })
        .collect()
}

/// Literal `true`/`false`, ignoring redundant parentheses.
fn constant(expression: &str) -> Option<bool> {
    let mut e = expression.trim();
    while let Some(inner) = e.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        e = inner.trim();
    }
    match e {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// A path is impossible when it needs a constant condition to take the
/// other value, or the same `if` condition both held and failed.
fn is_impossible(conditions: &[ConditionPath]) -> bool {
    let constant_blocks = conditions.iter().any(|c| match c.kind {
        StatementKind::If => constant(&c.expression) == Some(c.negated),
        StatementKind::While => constant(&c.expression) == Some(false),
        _ => false,
    });
    if constant_blocks {
        return true;
    }

    let ifs: Vec<&ConditionPath> = conditions
        .iter()
        .filter(|c| c.kind == StatementKind::If)
        .collect();
    ifs.iter().enumerate().any(|(i, a)| {
        ifs[i + 1..]
            .iter()
            .any(|b| a.expression.trim() == b.expression.trim() && a.negated != b.negated)
    })
}

pub fn is_reachable(statement: SyntaxNode<'_>) -> bool {
    !is_impossible(&conditions_leading_to(statement))
}

pub fn is_unconditionally_reachable(statement: SyntaxNode<'_>) -> bool {
    conditions_leading_to(statement).is_empty()
}

/// Outermost statement node spanning exactly `target`.
pub(crate) fn locate<'t>(tree: &'t SyntaxTree, target: &NodeMatch) -> Option<SyntaxNode<'t>> {
    tree.root().descendants().into_iter().find(|n| {
        n.byte_start() == target.byte_start
            && n.byte_end() == target.byte_end
            && is_statement_kind(n.ts_kind())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
class Pricing
{
    decimal Quote(Order order)
    {
        var total = 0m;
        if (order.IsValid)
        {
            for (int i = 0; i < order.Lines.Count; i++)
            {
                if (order.Lines[i].Taxable)
                {
                    total += Tax(order.Lines[i]);
                }
            }
        }
        else if (order.IsDraft)
        {
            Log("draft");
        }
        else
        {
            throw new InvalidOperationException();
        }
        return total;
    }
}
"#;

    fn statement<'t>(tree: &'t SyntaxTree, text: &str) -> SyntaxNode<'t> {
        tree.root()
            .descendants()
            .into_iter()
            .find(|n| is_statement_kind(n.ts_kind()) && n.text() == text)
            .unwrap()
    }

    #[test]
    fn nested_guards_outermost_first() {
        let tree = SyntaxTree::parse(SOURCE).unwrap();
        let stmt = statement(&tree, "total += Tax(order.Lines[i]);");
        let conditions = conditions_leading_to(stmt);

        let shown: Vec<String> = conditions.iter().map(ToString::to_string).collect();
        assert_eq!(
            shown,
            vec![
                "if(order.IsValid)",
                "for(i < order.Lines.Count)",
                "if(order.Lines[i].Taxable)",
            ]
        );
        let levels: Vec<usize> = conditions.iter().map(|c| c.nesting_level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn else_branches_are_negated() {
        let tree = SyntaxTree::parse(SOURCE).unwrap();

        let draft = conditions_leading_to(statement(&tree, "Log(\"draft\");"));
        assert_eq!(draft.len(), 2);
        assert!(draft[0].negated);
        assert_eq!(draft[0].expression, "order.IsValid");
        assert!(!draft[1].negated);
        assert_eq!(draft[1].expression, "order.IsDraft");

        let throw = conditions_leading_to(statement(&tree, "throw new InvalidOperationException();"));
        assert!(throw.iter().all(|c| c.negated));
        assert_eq!(throw.len(), 2);
    }

    #[test]
    fn top_level_statements_are_unconditional() {
        let tree = SyntaxTree::parse(SOURCE).unwrap();
        let ret = statement(&tree, "return total;");
        assert!(conditions_leading_to(ret).is_empty());
        assert!(is_unconditionally_reachable(ret));
        assert!(is_reachable(ret));

        let nested = statement(&tree, "Log(\"draft\");");
        assert!(!is_unconditionally_reachable(nested));
        assert!(is_reachable(nested));
    }

    #[test]
    fn paths_cover_every_statement() {
        let tree = SyntaxTree::parse(SOURCE).unwrap();
        let method = tree
            .root()
            .descendants()
            .into_iter()
            .find(|n| n.ts_kind() == "method_declaration")
            .unwrap();
        let paths = conditional_paths(method);

        assert_eq!(paths.len(), 9);
        assert!(paths.iter().all(|p| p.statement.grammar_kind != "block"));
        assert!(paths[0].is_unconditional());
        assert_eq!(paths[0].statement.text, "var total = 0m;");
        assert_eq!(paths.iter().filter(|p| p.is_unconditional()).count(), 3);
    }

    #[test]
    fn contradictions_are_unreachable() {
        let source = r#"
class A
{
    void M(bool ready)
    {
        if (ready)
        {
            if (true) { Go(); }
        }
        else
        {
            if (ready) { Never(); }
        }
        if (false) { Dead(); }
        while ((false)) { Spin(); }
    }
}
"#;
        let tree = SyntaxTree::parse(source).unwrap();
        assert!(is_reachable(statement(&tree, "Go();")));
        assert!(!is_reachable(statement(&tree, "Never();")));
        assert!(!is_reachable(statement(&tree, "Dead();")));
        assert!(!is_reachable(statement(&tree, "Spin();")));
    }

    #[test]
    fn header_parts_are_not_guarded() {
        let source = "class A { void M() { foreach (var x in Load(() => { return 1; })) { Use(x); } } }";
        let tree = SyntaxTree::parse(source).unwrap();
        assert!(conditions_leading_to(statement(&tree, "return 1;")).is_empty());

        let body = conditions_leading_to(statement(&tree, "Use(x);"));
        assert_eq!(body[0].kind, StatementKind::ForEach);
        assert_eq!(body[0].expression, "var x in Load(() => { return 1; })");
    }
}
