use crate::query::context::{NodeMatch, Query, Selectable};
use crate::query::errors::{require_non_empty, QueryError};
use crate::syntax::{NodeKind, StatementKind, SyntaxTree};

/// Snapshot of one control-flow statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementMatch {
    pub node: NodeMatch,
    pub statement_kind: StatementKind,
    pub method: Option<String>,
}

impl Selectable for StatementMatch {
    const LABEL: &'static str = "Statement query";
    const NOUN: &'static str = "statements";

    fn collect(tree: &SyntaxTree) -> Vec<Self> {
        tree.root()
            .descendants()
            .into_iter()
            .filter_map(|n| match n.kind() {
                NodeKind::Statement(statement_kind) => Some(StatementMatch {
                    node: NodeMatch::from_node(n),
                    statement_kind,
                    method: n
                        .containing_callable()
                        .and_then(|c| c.name())
                        .map(str::to_string),
                }),
                _ => None,
            })
            .collect()
    }

    fn describe(&self) -> String {
        format!("Statement: {}", self.statement_kind)
    }

    fn node(&self) -> &NodeMatch {
        &self.node
    }
}

pub type StatementQuery<'c> = Query<'c, StatementMatch>;

impl<'c> Query<'c, StatementMatch> {
    pub fn of_kind(self, kind: StatementKind) -> Self {
        self.matching(&format!("kind {kind}"), move |s| s.statement_kind == kind)
    }

    pub fn in_method(self, method: &str) -> Result<Self, QueryError> {
        require_non_empty("in_method", method)?;
        let method = method.to_string();
        Ok(self.matching(&format!("in method {method}"), move |s| {
            s.method.as_deref() == Some(method.as_str())
        }))
    }

    pub fn containing(self, fragment: &str) -> Result<Self, QueryError> {
        require_non_empty("containing", fragment)?;
        let fragment = fragment.to_string();
        Ok(self.matching(&format!("contains {fragment}"), move |s| {
            s.node.text.contains(&fragment)
        }))
    }
}
