use crate::query::context::{NodeMatch, Query, Selectable};
use crate::query::errors::{require_non_empty, QueryError};
use crate::syntax::{NodeKind, SyntaxNode, SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
    Local,
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberKind::Field => f.write_str("Field"),
            MemberKind::Property => f.write_str("Property"),
            MemberKind::Local => f.write_str("Local"),
        }
    }
}

/// One declared name: a field or local declarator, or a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberMatch {
    /// The declarator (or property) node; `kind` is the owning declaration's.
    pub node: NodeMatch,
    pub member_kind: MemberKind,
    pub name: String,
    pub type_name: String,
    pub modifiers: Vec<String>,
    pub attributes: Vec<String>,
    pub initializer: Option<String>,
    pub containing_type: Option<String>,
    pub containing_method: Option<String>,
}

/// Initializer expression of a declarator or property.
pub(crate) fn initializer_of<'t>(node: SyntaxNode<'t>) -> Option<SyntaxNode<'t>> {
    if node.ts_kind() == "property_declaration" {
        if let Some(value) = node.field("value") {
            return (value.ts_kind() != "arrow_expression_clause").then_some(value);
        }
    }
    let children = node.children();
    if let Some(clause) = children
        .iter()
        .find(|c| c.ts_kind() == "equals_value_clause")
    {
        return clause.first_named_child();
    }
    let eq = children.iter().position(|c| c.text() == "=")?;
    children[eq + 1..].iter().find(|c| c.is_named()).copied()
}

impl MemberMatch {
    fn build(node: SyntaxNode<'_>, member_kind: MemberKind, kind: NodeKind) -> Self {
        let mut snapshot = NodeMatch::from_node(node);
        snapshot.kind = kind;
        Self {
            node: snapshot,
            member_kind,
            name: node.name().unwrap_or_default().to_string(),
            type_name: node.declared_type().unwrap_or_default().to_string(),
            modifiers: node.modifiers().iter().map(|m| m.to_string()).collect(),
            attributes: node.attributes().iter().map(|a| a.to_string()).collect(),
            initializer: initializer_of(node).map(|i| i.text().to_string()),
            containing_type: node
                .containing_type()
                .and_then(|t| t.name())
                .map(str::to_string),
            containing_method: node
                .containing_callable()
                .and_then(|m| m.name())
                .map(str::to_string),
        }
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }
}

fn owner_kind(declarator: SyntaxNode<'_>) -> Option<(MemberKind, NodeKind)> {
    let declaration = declarator
        .parent()
        .filter(|p| p.ts_kind() == "variable_declaration")?
        .parent()?;
    match declaration.ts_kind() {
        "field_declaration" => Some((MemberKind::Field, NodeKind::Field)),
        "local_declaration_statement" => Some((MemberKind::Local, NodeKind::Other)),
        _ => None,
    }
}

impl Selectable for MemberMatch {
    const LABEL: &'static str = "Variable query";
    const NOUN: &'static str = "variables";

    fn collect(tree: &SyntaxTree) -> Vec<Self> {
        let mut out = Vec::new();
        for node in tree.root().descendants() {
            match node.ts_kind() {
                "property_declaration" => {
                    out.push(MemberMatch::build(node, MemberKind::Property, NodeKind::Property));
                }
                "variable_declarator" => {
                    if let Some((member_kind, kind)) = owner_kind(node) {
                        out.push(MemberMatch::build(node, member_kind, kind));
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn describe(&self) -> String {
        format!("{}: {} {}", self.member_kind, self.type_name, self.name)
    }

    fn node(&self) -> &NodeMatch {
        &self.node
    }
}

pub type MemberQuery<'c> = Query<'c, MemberMatch>;

impl<'c> Query<'c, MemberMatch> {
    pub fn with_name(self, name: &str) -> Result<Self, QueryError> {
        require_non_empty("with_name", name)?;
        let name = name.to_string();
        Ok(self.matching(&format!("name == {name}"), move |m| m.name == name))
    }

    pub fn with_name_containing(self, fragment: &str) -> Result<Self, QueryError> {
        require_non_empty("with_name_containing", fragment)?;
        let fragment = fragment.to_lowercase();
        Ok(self.matching(&format!("name contains {fragment}"), move |m| {
            m.name.to_lowercase().contains(&fragment)
        }))
    }

    /// Declared type contains `type_name`.
    pub fn with_type(self, type_name: &str) -> Result<Self, QueryError> {
        require_non_empty("with_type", type_name)?;
        let type_name = type_name.to_string();
        Ok(self.matching(&format!("type {type_name}"), move |m| {
            m.type_name.contains(&type_name)
        }))
    }

    pub fn with_attribute(self, attribute: &str) -> Result<Self, QueryError> {
        require_non_empty("with_attribute", attribute)?;
        let attribute = attribute.to_string();
        Ok(self.matching(&format!("attribute {attribute}"), move |m| {
            m.attributes.iter().any(|a| a.contains(&attribute))
        }))
    }

    pub fn in_class(self, class: &str) -> Result<Self, QueryError> {
        require_non_empty("in_class", class)?;
        let class = class.to_string();
        Ok(self.matching(&format!("declared in {class}"), move |m| {
            m.containing_type.as_deref() == Some(class.as_str())
        }))
    }

    pub fn is_public(self) -> Self {
        self.matching("is public", |m| m.has_modifier("public"))
    }

    pub fn is_protected(self) -> Self {
        self.matching("is protected", |m| m.has_modifier("protected"))
    }

    /// Explicitly private, or no accessibility modifier at all.
    pub fn is_private(self) -> Self {
        self.matching("is private", |m| {
            m.has_modifier("private")
                || !["public", "protected", "internal"]
                    .iter()
                    .any(|a| m.has_modifier(a))
        })
    }

    pub fn is_readonly(self) -> Self {
        self.matching("is readonly", |m| m.has_modifier("readonly"))
    }

    pub fn is_static(self) -> Self {
        self.matching("is static", |m| m.has_modifier("static"))
    }

    pub fn with_initializer(self) -> Self {
        self.matching("has initializer", |m| m.initializer.is_some())
    }

    pub fn fields_only(self) -> Self {
        self.matching("fields only", |m| m.member_kind == MemberKind::Field)
    }

    pub fn properties_only(self) -> Self {
        self.matching("properties only", |m| m.member_kind == MemberKind::Property)
    }

    pub fn locals_only(self) -> Self {
        self.matching("locals only", |m| m.member_kind == MemberKind::Local)
    }
}
