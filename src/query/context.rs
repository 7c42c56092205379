use crate::observer::{self, Observer};
use crate::query::class::ClassMatch;
use crate::query::conditions::{self, ConditionPath, StatementPath};
use crate::query::errors::{require_non_empty, QueryError};
use crate::query::member::MemberMatch;
use crate::query::method::MethodMatch;
use crate::query::pattern::{self, PatternMatch};
use crate::query::returns::ReturnMatch;
use crate::query::statement::StatementMatch;
use crate::syntax::{NodeKind, SyntaxError, SyntaxNode, SyntaxTree};
use std::sync::Arc;

/// Owned snapshot of one node: enough to report and edit it without the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMatch {
    pub kind: NodeKind,
    pub grammar_kind: &'static str,
    pub byte_start: usize,
    pub byte_end: usize,
    /// 1-based line
    pub line: usize,
    pub text: String,
}

impl NodeMatch {
    pub fn from_node(node: SyntaxNode<'_>) -> Self {
        Self {
            kind: node.kind(),
            grammar_kind: node.ts_kind(),
            byte_start: node.byte_start(),
            byte_end: node.byte_end(),
            line: node.line(),
            text: node.text().to_string(),
        }
    }
}

/// One result family of the query engine.
pub trait Selectable: Clone {
    /// Label used in observer events, e.g. `"Method query"`.
    const LABEL: &'static str;
    /// Plural noun used in observer events, e.g. `"methods"`.
    const NOUN: &'static str;

    /// Every candidate in the tree, in document order.
    fn collect(tree: &SyntaxTree) -> Vec<Self>;

    /// Short description for selection events.
    fn describe(&self) -> String;

    fn node(&self) -> &NodeMatch;
}

type Predicate<'c, T> = Box<dyn Fn(&T) -> bool + 'c>;

/// Lazy, fluent query over one result family.
///
/// Filters only record predicates. Nothing is evaluated until
/// [`Query::execute`], which re-scans the whole tree on every call.
pub struct Query<'c, T: Selectable> {
    ctx: &'c SearchContext,
    predicates: Vec<Predicate<'c, T>>,
}

impl<'c, T: Selectable> Query<'c, T> {
    pub(crate) fn new(ctx: &'c SearchContext) -> Self {
        Self {
            ctx,
            predicates: Vec::new(),
        }
    }

    /// Append an arbitrary predicate.
    pub fn matching(mut self, label: &str, predicate: impl Fn(&T) -> bool + 'c) -> Self {
        self.ctx
            .observer
            .on_debug(&format!("{} filter added: {label}", T::LABEL));
        self.predicates.push(Box::new(predicate));
        self
    }

    fn accepts(&self, item: &T) -> bool {
        self.predicates.iter().all(|p| p(item))
    }

    /// Evaluate every predicate against a fresh scan of the tree.
    pub fn execute(&self) -> Vec<T> {
        let results: Vec<T> = T::collect(self.ctx.tree())
            .into_iter()
            .filter(|item| self.accepts(item))
            .collect();

        let observer = &self.ctx.observer;
        observer.on_info(&format!(
            "{} executed: found {} {}",
            T::LABEL,
            results.len(),
            T::NOUN
        ));
        for item in &results {
            observer.on_selection(&item.describe(), &item.node().text);
        }
        results
    }

    pub fn count(&self) -> usize {
        self.execute().len()
    }

    /// First match, or `None` when nothing matches.
    pub fn first_or_default(&self) -> Option<T> {
        self.execute().into_iter().next()
    }

    pub fn any(&self) -> bool {
        self.count() > 0
    }
}

/// Entry point of the query engine: one parsed file plus an observer.
pub struct SearchContext {
    tree: SyntaxTree,
    observer: Arc<dyn Observer>,
}

impl SearchContext {
    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        Ok(Self::from_tree(SyntaxTree::parse(text)?))
    }

    pub fn from_tree(tree: SyntaxTree) -> Self {
        Self {
            tree,
            observer: observer::null(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn observer(&self) -> &Arc<dyn Observer> {
        &self.observer
    }

    pub fn find_methods(&self) -> Query<'_, MethodMatch> {
        Query::new(self)
    }

    pub fn find_classes(&self) -> Query<'_, ClassMatch> {
        Query::new(self)
    }

    /// Fields, properties and locals, one result per declared name.
    pub fn find_members(&self) -> Query<'_, MemberMatch> {
        Query::new(self)
    }

    pub fn find_returns(&self) -> Query<'_, ReturnMatch> {
        Query::new(self)
    }

    pub fn find_statements(&self) -> Query<'_, StatementMatch> {
        Query::new(self)
    }

    /// Every node satisfying `predicate`, in document order.
    pub fn find_by_predicate<F>(&self, predicate: F) -> Vec<NodeMatch>
    where
        F: Fn(SyntaxNode<'_>) -> bool,
    {
        let results: Vec<NodeMatch> = self
            .tree
            .root()
            .descendants()
            .into_iter()
            .filter(|n| n.is_named() && predicate(*n))
            .map(NodeMatch::from_node)
            .collect();

        self.observer.on_info(&format!(
            "Predicate query executed: found {} nodes",
            results.len()
        ));
        for m in &results {
            self.observer
                .on_selection(&format!("Node: {}", m.grammar_kind), &m.text);
        }
        results
    }

    /// Run an ast-grep structural pattern (`$NAME`, `$$$ARGS`) over the tree.
    pub fn find_by_pattern(&self, pattern: &str) -> Result<Vec<PatternMatch>, QueryError> {
        let results = pattern::find_all(self.tree.print(), pattern)?;
        self.observer.on_info(&format!(
            "Pattern query executed: found {} matches",
            results.len()
        ));
        for m in &results {
            self.observer
                .on_selection(&format!("Pattern: {pattern}"), &m.text);
        }
        Ok(results)
    }
}

/// Control-flow facts about individual statements.
impl SearchContext {
    fn statement_node(&self, statement: &NodeMatch) -> Result<SyntaxNode<'_>, QueryError> {
        conditions::locate(&self.tree, statement).ok_or(QueryError::StatementNotFound {
            byte_start: statement.byte_start,
            byte_end: statement.byte_end,
        })
    }

    /// Guards (`if`, loops, `switch`) enclosing `statement`, outermost first.
    pub fn find_conditions_leading_to(
        &self,
        statement: &NodeMatch,
    ) -> Result<Vec<ConditionPath>, QueryError> {
        let found = conditions::conditions_leading_to(self.statement_node(statement)?);
        self.observer.on_info(&format!(
            "Condition query executed: found {} conditions",
            found.len()
        ));
        for c in &found {
            self.observer
                .on_selection(&format!("Condition: level {}", c.nesting_level), &c.to_string());
        }
        Ok(found)
    }

    /// Every statement of the first method named `method`, with its guards.
    /// Unknown or body-less methods yield no paths.
    pub fn find_all_conditional_paths(
        &self,
        method: &str,
    ) -> Result<Vec<StatementPath>, QueryError> {
        require_non_empty("find_all_conditional_paths", method)?;
        let paths = self
            .tree
            .root()
            .descendants()
            .into_iter()
            .find(|n| n.ts_kind() == "method_declaration" && n.name() == Some(method))
            .map(conditions::conditional_paths)
            .unwrap_or_default();
        self.observer.on_info(&format!(
            "Conditional path query executed: found {} statements in {method}",
            paths.len()
        ));
        Ok(paths)
    }

    /// `false` when the guards leading to `statement` contradict each other.
    pub fn is_statement_reachable(&self, statement: &NodeMatch) -> Result<bool, QueryError> {
        let reachable = conditions::is_reachable(self.statement_node(statement)?);
        self.observer
            .on_debug(&format!("Statement reachability: {reachable}"));
        Ok(reachable)
    }

    /// `true` when no guard encloses `statement`.
    pub fn is_statement_unconditionally_reachable(
        &self,
        statement: &NodeMatch,
    ) -> Result<bool, QueryError> {
        let unconditional =
            conditions::is_unconditionally_reachable(self.statement_node(statement)?);
        self.observer
            .on_debug(&format!("Statement unconditional reachability: {unconditional}"));
        Ok(unconditional)
    }
}

impl std::fmt::Debug for SearchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}
