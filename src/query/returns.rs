use crate::query::context::{NodeMatch, Query, Selectable};
use crate::query::errors::{require_non_empty, QueryError};
use crate::syntax::{SyntaxNode, SyntaxTree};

/// Snapshot of one `return` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnMatch {
    pub node: NodeMatch,
    /// Returned expression, `None` for a bare `return;`.
    pub expression: Option<String>,
    pub expression_kind: Option<&'static str>,
    /// Name of the nearest enclosing method, accessor or local function.
    pub method: Option<String>,
    pub method_return_type: Option<String>,
}

impl ReturnMatch {
    fn from_node(node: SyntaxNode<'_>) -> Self {
        let expression = node.first_named_child();
        let callable = node.containing_callable();
        Self {
            node: NodeMatch::from_node(node),
            expression: expression.map(|e| e.text().to_string()),
            expression_kind: expression.map(|e| e.ts_kind()),
            method: callable.and_then(|c| c.name()).map(str::to_string),
            method_return_type: callable
                .and_then(|c| c.return_type())
                .map(str::to_string),
        }
    }
}

impl Selectable for ReturnMatch {
    const LABEL: &'static str = "Return query";
    const NOUN: &'static str = "return statements";

    fn collect(tree: &SyntaxTree) -> Vec<Self> {
        tree.root()
            .descendants()
            .into_iter()
            .filter(|n| n.ts_kind() == "return_statement")
            .map(ReturnMatch::from_node)
            .collect()
    }

    fn describe(&self) -> String {
        match &self.method {
            Some(method) => format!("Return in {method}"),
            None => "Return".to_string(),
        }
    }

    fn node(&self) -> &NodeMatch {
        &self.node
    }
}

pub type ReturnQuery<'c> = Query<'c, ReturnMatch>;

impl<'c> Query<'c, ReturnMatch> {
    pub fn in_method(self, method: &str) -> Result<Self, QueryError> {
        require_non_empty("in_method", method)?;
        let method = method.to_string();
        Ok(self.matching(&format!("in method {method}"), move |r| {
            r.method.as_deref() == Some(method.as_str())
        }))
    }

    /// Enclosing method's return type contains `type_name`.
    pub fn returning_type(self, type_name: &str) -> Result<Self, QueryError> {
        require_non_empty("returning_type", type_name)?;
        let type_name = type_name.to_string();
        Ok(self.matching(&format!("method returns {type_name}"), move |r| {
            r.method_return_type
                .as_deref()
                .is_some_and(|t| t.contains(&type_name))
        }))
    }

    pub fn returning_null(self) -> Self {
        self.matching("returns null", |r| r.expression.as_deref() == Some("null"))
    }

    pub fn with_expression(self, predicate: impl Fn(&str) -> bool + 'c) -> Self {
        self.matching("expression predicate", move |r| {
            r.expression.as_deref().is_some_and(&predicate)
        })
    }

    pub fn without_expression(self) -> Self {
        self.matching("bare return", |r| r.expression.is_none())
    }
}
