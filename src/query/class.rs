use crate::query::context::{NodeMatch, Query, Selectable};
use crate::query::errors::{require_non_empty, QueryError};
use crate::syntax::{SyntaxNode, SyntaxTree};

/// Snapshot of one class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMatch {
    pub node: NodeMatch,
    pub name: String,
    pub modifiers: Vec<String>,
    pub attributes: Vec<String>,
    /// Printed base list, without the colon.
    pub base_types: Option<String>,
    pub namespace: Option<String>,
    pub member_count: usize,
    pub method_names: Vec<String>,
}

impl ClassMatch {
    fn from_node(node: SyntaxNode<'_>) -> Self {
        let members: Vec<SyntaxNode<'_>> = node
            .field("body")
            .or_else(|| node.child_of_kind("declaration_list"))
            .map(|body| {
                body.named_children()
                    .into_iter()
                    .filter(|c| c.ts_kind() != "comment")
                    .collect()
            })
            .unwrap_or_default();

        Self {
            node: NodeMatch::from_node(node),
            name: node.name().unwrap_or_default().to_string(),
            modifiers: node.modifiers().iter().map(|m| m.to_string()).collect(),
            attributes: node.attributes().iter().map(|a| a.to_string()).collect(),
            base_types: node.base_types().map(str::to_string),
            namespace: node.namespace(),
            member_count: members.len(),
            method_names: members
                .iter()
                .filter(|m| m.ts_kind() == "method_declaration")
                .filter_map(|m| m.name())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

impl Selectable for ClassMatch {
    const LABEL: &'static str = "Class query";
    const NOUN: &'static str = "classes";

    fn collect(tree: &SyntaxTree) -> Vec<Self> {
        tree.root()
            .descendants()
            .into_iter()
            .filter(|n| n.ts_kind() == "class_declaration")
            .map(ClassMatch::from_node)
            .collect()
    }

    fn describe(&self) -> String {
        format!("Class: {}", self.name)
    }

    fn node(&self) -> &NodeMatch {
        &self.node
    }
}

pub type ClassQuery<'c> = Query<'c, ClassMatch>;

impl<'c> Query<'c, ClassMatch> {
    pub fn with_name(self, name: &str) -> Result<Self, QueryError> {
        require_non_empty("with_name", name)?;
        let name = name.to_string();
        Ok(self.matching(&format!("name == {name}"), move |c| c.name == name))
    }

    pub fn with_name_containing(self, fragment: &str) -> Result<Self, QueryError> {
        require_non_empty("with_name_containing", fragment)?;
        let fragment = fragment.to_lowercase();
        Ok(self.matching(&format!("name contains {fragment}"), move |c| {
            c.name.to_lowercase().contains(&fragment)
        }))
    }

    pub fn in_namespace(self, prefix: &str) -> Result<Self, QueryError> {
        require_non_empty("in_namespace", prefix)?;
        let prefix = prefix.to_string();
        Ok(self.matching(&format!("namespace starts with {prefix}"), move |c| {
            c.namespace
                .as_deref()
                .is_some_and(|ns| ns.starts_with(&prefix))
        }))
    }

    pub fn with_attribute(self, attribute: &str) -> Result<Self, QueryError> {
        require_non_empty("with_attribute", attribute)?;
        let attribute = attribute.to_string();
        Ok(self.matching(&format!("attribute {attribute}"), move |c| {
            c.attributes.iter().any(|a| a.contains(&attribute))
        }))
    }

    /// Base list mentions `base` (textual).
    pub fn inherits(self, base: &str) -> Result<Self, QueryError> {
        require_non_empty("inherits", base)?;
        let base = base.to_string();
        Ok(self.matching(&format!("inherits {base}"), move |c| {
            c.base_types.as_deref().is_some_and(|b| b.contains(&base))
        }))
    }

    /// Same textual test as [`Self::inherits`]; C# syntax does not separate the two.
    pub fn implements(self, interface: &str) -> Result<Self, QueryError> {
        require_non_empty("implements", interface)?;
        let interface = interface.to_string();
        Ok(self.matching(&format!("implements {interface}"), move |c| {
            c.base_types
                .as_deref()
                .is_some_and(|b| b.contains(&interface))
        }))
    }

    pub fn is_public(self) -> Self {
        self.matching("is public", |c| c.has_modifier("public"))
    }

    pub fn is_protected(self) -> Self {
        self.matching("is protected", |c| c.has_modifier("protected"))
    }

    /// Explicitly private, or no accessibility modifier at all.
    pub fn is_private(self) -> Self {
        self.matching("is private", |c| {
            c.has_modifier("private")
                || !["public", "protected", "internal"]
                    .iter()
                    .any(|m| c.has_modifier(m))
        })
    }

    pub fn is_abstract(self) -> Self {
        self.matching("is abstract", |c| c.has_modifier("abstract"))
    }

    pub fn is_sealed(self) -> Self {
        self.matching("is sealed", |c| c.has_modifier("sealed"))
    }

    pub fn is_static(self) -> Self {
        self.matching("is static", |c| c.has_modifier("static"))
    }

    pub fn with_member_count(self, predicate: impl Fn(usize) -> bool + 'c) -> Self {
        self.matching("member count", move |c| predicate(c.member_count))
    }

    pub fn with_method(self, method: &str) -> Result<Self, QueryError> {
        require_non_empty("with_method", method)?;
        let method = method.to_string();
        Ok(self.matching(&format!("declares {method}"), move |c| {
            c.method_names.iter().any(|m| *m == method)
        }))
    }
}
