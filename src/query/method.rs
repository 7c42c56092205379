use crate::query::context::{NodeMatch, Query, Selectable};
use crate::query::errors::{require_non_empty, QueryError};
use crate::syntax::{SyntaxNode, SyntaxTree};
use std::collections::HashSet;

/// Snapshot of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub type_name: String,
    pub name: String,
    pub modifiers: Vec<String>,
}

/// Snapshot of one method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodMatch {
    pub node: NodeMatch,
    pub name: String,
    pub return_type: String,
    pub modifiers: Vec<String>,
    pub attributes: Vec<String>,
    pub parameters: Vec<ParameterInfo>,
    pub namespace: Option<String>,
    pub containing_type: Option<String>,
    pub has_block_body: bool,
    /// 1 + decision points in the body.
    pub complexity: usize,
    pub body_lines: usize,
    pub unused_parameters: Vec<String>,
}

impl MethodMatch {
    pub(crate) fn from_node(node: SyntaxNode<'_>) -> Self {
        let parameters: Vec<ParameterInfo> = node
            .parameters()
            .into_iter()
            .map(|p| ParameterInfo {
                type_name: p.type_name.to_string(),
                name: p.name.to_string(),
                modifiers: p.modifiers.iter().map(|m| m.to_string()).collect(),
            })
            .collect();

        let body = node.body();
        let used: HashSet<&str> = body
            .map(|b| {
                b.descendants()
                    .into_iter()
                    .filter(|n| n.ts_kind() == "identifier")
                    .map(|n| n.text())
                    .collect()
            })
            .unwrap_or_default();
        let unused_parameters = if body.is_some() {
            parameters
                .iter()
                .filter(|p| !p.name.is_empty() && !used.contains(p.name.as_str()))
                .map(|p| p.name.clone())
                .collect()
        } else {
            Vec::new()
        };

        Self {
            node: NodeMatch::from_node(node),
            name: node.name().unwrap_or_default().to_string(),
            return_type: node.return_type().unwrap_or_default().to_string(),
            modifiers: node.modifiers().iter().map(|m| m.to_string()).collect(),
            attributes: node.attributes().iter().map(|a| a.to_string()).collect(),
            parameters,
            namespace: node.namespace(),
            containing_type: node
                .containing_type()
                .and_then(|t| t.name())
                .map(str::to_string),
            has_block_body: node.block_body().is_some(),
            complexity: body.map(cyclomatic_complexity).unwrap_or(1),
            body_lines: body.map(|b| b.text().lines().count()).unwrap_or(0),
            unused_parameters,
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    /// Explicitly private, or no accessibility modifier at all.
    pub fn is_private(&self) -> bool {
        self.has_modifier("private")
            || !["public", "protected", "internal"]
                .iter()
                .any(|m| self.has_modifier(m))
    }
}

/// 1 + if + switch sections + loops + catch clauses.
pub(crate) fn cyclomatic_complexity(body: SyntaxNode<'_>) -> usize {
    1 + body
        .descendants()
        .into_iter()
        .filter(|n| {
            matches!(
                n.ts_kind(),
                "if_statement"
                    | "switch_section"
                    | "for_statement"
                    | "foreach_statement"
                    | "while_statement"
                    | "do_statement"
                    | "catch_clause"
            )
        })
        .count()
}

impl Selectable for MethodMatch {
    const LABEL: &'static str = "Method query";
    const NOUN: &'static str = "methods";

    fn collect(tree: &SyntaxTree) -> Vec<Self> {
        tree.root()
            .descendants()
            .into_iter()
            .filter(|n| n.ts_kind() == "method_declaration")
            .map(MethodMatch::from_node)
            .collect()
    }

    fn describe(&self) -> String {
        format!("Method: {}", self.name)
    }

    fn node(&self) -> &NodeMatch {
        &self.node
    }
}

pub type MethodQuery<'c> = Query<'c, MethodMatch>;

impl<'c> Query<'c, MethodMatch> {
    pub fn with_name(self, name: &str) -> Result<Self, QueryError> {
        require_non_empty("with_name", name)?;
        let name = name.to_string();
        Ok(self.matching(&format!("name == {name}"), move |m| m.name == name))
    }

    /// Case-insensitive substring match on the method name.
    pub fn with_name_containing(self, fragment: &str) -> Result<Self, QueryError> {
        require_non_empty("with_name_containing", fragment)?;
        let fragment = fragment.to_lowercase();
        Ok(self.matching(&format!("name contains {fragment}"), move |m| {
            m.name.to_lowercase().contains(&fragment)
        }))
    }

    /// Namespace starts with `prefix`.
    pub fn in_namespace(self, prefix: &str) -> Result<Self, QueryError> {
        require_non_empty("in_namespace", prefix)?;
        let prefix = prefix.to_string();
        Ok(self.matching(&format!("namespace starts with {prefix}"), move |m| {
            m.namespace
                .as_deref()
                .is_some_and(|ns| ns.starts_with(&prefix))
        }))
    }

    pub fn in_class(self, class: &str) -> Result<Self, QueryError> {
        require_non_empty("in_class", class)?;
        let class = class.to_string();
        Ok(self.matching(&format!("declared in {class}"), move |m| {
            m.containing_type.as_deref() == Some(class.as_str())
        }))
    }

    /// Any applied attribute name contains `attribute`.
    pub fn with_attribute(self, attribute: &str) -> Result<Self, QueryError> {
        require_non_empty("with_attribute", attribute)?;
        let attribute = attribute.to_string();
        Ok(self.matching(&format!("attribute {attribute}"), move |m| {
            m.attributes.iter().any(|a| a.contains(&attribute))
        }))
    }

    pub fn is_public(self) -> Self {
        self.matching("is public", |m| m.has_modifier("public"))
    }

    pub fn is_protected(self) -> Self {
        self.matching("is protected", |m| m.has_modifier("protected"))
    }

    pub fn is_private(self) -> Self {
        self.matching("is private", MethodMatch::is_private)
    }

    pub fn is_abstract(self) -> Self {
        self.matching("is abstract", |m| m.has_modifier("abstract"))
    }

    pub fn is_sealed(self) -> Self {
        self.matching("is sealed", |m| m.has_modifier("sealed"))
    }

    pub fn is_static(self) -> Self {
        self.matching("is static", |m| m.has_modifier("static"))
    }

    pub fn is_async(self) -> Self {
        self.matching("is async", |m| m.has_modifier("async"))
    }

    pub fn is_virtual(self) -> Self {
        self.matching("is virtual", |m| m.has_modifier("virtual"))
    }

    pub fn is_override(self) -> Self {
        self.matching("is override", |m| m.has_modifier("override"))
    }

    pub fn has_parameter_count(self, count: usize) -> Self {
        self.matching(&format!("{count} parameters"), move |m| {
            m.parameters.len() == count
        })
    }

    /// Any parameter satisfies `predicate`.
    pub fn has_parameter(self, predicate: impl Fn(&ParameterInfo) -> bool + 'c) -> Self {
        self.matching("has parameter", move |m| m.parameters.iter().any(&predicate))
    }

    pub fn has_parameter_of_type(self, type_name: &str) -> Result<Self, QueryError> {
        require_non_empty("has_parameter_of_type", type_name)?;
        let type_name = type_name.to_string();
        Ok(self.has_parameter(move |p| p.type_name.contains(&type_name)))
    }

    /// Printed return type contains `type_name`.
    pub fn returning_type(self, type_name: &str) -> Result<Self, QueryError> {
        require_non_empty("returning_type", type_name)?;
        let type_name = type_name.to_string();
        Ok(self.matching(&format!("returns {type_name}"), move |m| {
            m.return_type.contains(&type_name)
        }))
    }

    pub fn returning_void(self) -> Self {
        self.matching("returns void", |m| m.return_type == "void")
    }

    pub fn returning_task(self) -> Self {
        self.matching("returns Task", |m| m.return_type.starts_with("Task"))
    }

    /// Returns `Task<T>` for the given `T` (textual).
    pub fn returning_task_of(self, inner: &str) -> Result<Self, QueryError> {
        require_non_empty("returning_task_of", inner)?;
        let expected: String = format!("Task<{inner}>")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Ok(self.matching(&format!("returns {expected}"), move |m| {
            let actual: String = m.return_type.chars().filter(|c| !c.is_whitespace()).collect();
            actual == expected
        }))
    }

    pub fn with_complexity_above(self, threshold: usize) -> Self {
        self.matching(&format!("complexity > {threshold}"), move |m| {
            m.complexity > threshold
        })
    }

    pub fn with_body_lines_above(self, threshold: usize) -> Self {
        self.matching(&format!("body lines > {threshold}"), move |m| {
            m.body_lines > threshold
        })
    }

    pub fn with_unused_parameters(self) -> Self {
        self.matching("unused parameters", |m| !m.unused_parameters.is_empty())
    }
}
