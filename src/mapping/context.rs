use crate::syntax::node::{is_callable, is_nested_function, is_type_declaration};
use crate::syntax::{SyntaxNode, SyntaxTree};
use std::collections::HashMap;

/// Reconstructed parent chain of one property access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessContext {
    pub property_name: String,
    /// Trailing name of the qualifier expression (`order` in `order.Total`).
    pub qualifier: Option<String>,
    /// Declared type of the qualifier, or the enclosing type for bare names.
    pub parent_type: Option<String>,
    /// Owner chain leading to the property, root first.
    pub owner_path: Vec<String>,
    /// Declared type of the property itself when the file declares it.
    pub property_type: Option<String>,
}

impl AccessContext {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            ..Self::default()
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    pub fn with_parent_type(mut self, ty: impl Into<String>) -> Self {
        self.parent_type = Some(ty.into());
        self
    }

    pub fn with_owner_path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owner_path = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property_type(mut self, ty: impl Into<String>) -> Self {
        self.property_type = Some(ty.into());
        self
    }

    /// `Order.Customer` for an access `order.Customer.Name` where `order: Order`.
    pub fn type_path(&self) -> String {
        self.owner_path.join(".")
    }

    /// Equality or dotted-suffix match against the owner chain, with or
    /// without the property name appended.
    pub fn matches_type_path(&self, rule_path: &str) -> bool {
        if self.owner_path.is_empty() {
            return false;
        }
        let owner = self.type_path();
        let full = format!("{owner}.{}", self.property_name);
        [owner, full]
            .iter()
            .any(|p| p == rule_path || p.ends_with(&format!(".{rule_path}")))
    }
}

/// Member types of every type declared in one file.
#[derive(Debug, Default)]
pub(crate) struct TypeIndex {
    members: HashMap<String, HashMap<String, String>>,
}

impl TypeIndex {
    pub(crate) fn build(tree: &SyntaxTree) -> Self {
        let mut members: HashMap<String, HashMap<String, String>> = HashMap::new();
        for node in tree.root().descendants() {
            if !is_type_declaration(node.ts_kind()) {
                continue;
            }
            let Some(type_name) = node.name() else {
                continue;
            };
            let table = members.entry(type_name.to_string()).or_default();
            let Some(body) = node.field("body").or_else(|| node.child_of_kind("declaration_list"))
            else {
                continue;
            };
            for member in body.named_children() {
                match member.ts_kind() {
                    "property_declaration" => {
                        if let (Some(name), Some(ty)) = (member.name(), member.declared_type()) {
                            table.insert(name.to_string(), ty.to_string());
                        }
                    }
                    "field_declaration" | "event_field_declaration" => {
                        let Some(ty) = member.declared_type() else {
                            continue;
                        };
                        for decl in member.descendants() {
                            if decl.ts_kind() == "variable_declarator" {
                                if let Some(name) = decl.name() {
                                    table.insert(name.to_string(), ty.to_string());
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        Self { members }
    }

    pub(crate) fn has_type(&self, name: &str) -> bool {
        self.members.contains_key(base_type(name))
    }

    pub(crate) fn member_type(&self, owner: &str, member: &str) -> Option<&str> {
        self.members
            .get(base_type(owner))
            .and_then(|m| m.get(member))
            .map(String::as_str)
    }
}

/// `Order` for `Order?`, `Nullable<Order>`, `Ns.Order` or `List<Order>`'s head.
fn base_type(ty: &str) -> &str {
    let ty = ty.trim().trim_end_matches('?');
    let ty = ty
        .strip_prefix("Nullable<")
        .and_then(|t| t.strip_suffix('>'))
        .unwrap_or(ty);
    let head = ty.split('<').next().unwrap_or(ty);
    head.rsplit('.').next().unwrap_or(head).trim()
}

/// Where a local name was declared.
enum Binding {
    Variable(Option<String>),
    Member(String),
}

/// Declared type of a local, parameter, or member visible at `at`.
fn resolve_name(at: SyntaxNode<'_>, name: &str, index: &TypeIndex) -> Option<Binding> {
    for scope in at.ancestors() {
        let kind = scope.ts_kind();
        if is_callable(kind) || is_nested_function(kind) {
            if let Some(p) = scope.parameters().iter().find(|p| p.name == name) {
                let ty = (!p.type_name.is_empty()).then(|| p.type_name.to_string());
                return Some(Binding::Variable(ty));
            }
            if let Some(ty) = local_type(scope, name, at) {
                return Some(Binding::Variable(ty));
            }
        }
        if is_type_declaration(kind) {
            let owner = scope.name()?;
            if let Some(ty) = index.member_type(owner, name) {
                return Some(Binding::Member(ty.to_string()));
            }
        }
    }
    None
}

/// Type of a local declared in `scope` before `at`; `var` with `new T()` resolves to `T`.
fn local_type(scope: SyntaxNode<'_>, name: &str, at: SyntaxNode<'_>) -> Option<Option<String>> {
    let body = scope.body()?;
    let decl = body.descendants().into_iter().find(|d| {
        d.ts_kind() == "variable_declarator"
            && d.byte_start() < at.byte_start()
            && d.name() == Some(name)
    })?;
    let declared = decl.declared_type()?;
    if declared != "var" {
        return Some(Some(declared.to_string()));
    }
    let created = decl
        .descendants()
        .into_iter()
        .find(|n| n.ts_kind() == "object_creation_expression")
        .and_then(|n| n.field("type"))
        .map(|t| t.text().to_string());
    Some(created)
}

fn enclosing_type_name(node: SyntaxNode<'_>) -> Option<String> {
    node.containing_type()
        .and_then(|t| t.name())
        .map(str::to_string)
}

/// Resolved type and owner chain of a qualifier expression.
fn resolve_expression(expr: SyntaxNode<'_>, index: &TypeIndex) -> (Option<String>, Vec<String>) {
    match expr.ts_kind() {
        "this_expression" | "this" => {
            let ty = enclosing_type_name(expr);
            let path = ty.iter().cloned().collect();
            (ty, path)
        }
        "identifier" => {
            let name = expr.text();
            let ty = match resolve_name(expr, name, index) {
                Some(Binding::Variable(ty)) => ty,
                Some(Binding::Member(ty)) => Some(ty),
                None if index.has_type(name) => Some(name.to_string()),
                None => None,
            };
            let root = ty
                .as_deref()
                .map(|t| base_type(t).to_string())
                .unwrap_or_else(|| name.to_string());
            (ty, vec![root])
        }
        "member_access_expression" => {
            let Some(inner) = expr.field("expression") else {
                return (None, Vec::new());
            };
            let Some(name) = expr.field("name") else {
                return (None, Vec::new());
            };
            let (inner_ty, mut path) = resolve_expression(inner, index);
            path.push(name.text().to_string());
            let ty = inner_ty
                .as_deref()
                .and_then(|t| index.member_type(t, name.text()))
                .map(str::to_string);
            (ty, path)
        }
        "parenthesized_expression" => expr
            .first_named_child()
            .map(|e| resolve_expression(e, index))
            .unwrap_or_default(),
        _ => (None, vec![expr.text().to_string()]),
    }
}

fn trailing_name(expr: SyntaxNode<'_>) -> String {
    match expr.ts_kind() {
        "member_access_expression" => expr
            .field("name")
            .map(|n| n.text().to_string())
            .unwrap_or_default(),
        _ => expr.text().to_string(),
    }
}

/// Context for `name` used as the right-hand side of `qualifier.name`.
pub(crate) fn member_access_context(
    qualifier: SyntaxNode<'_>,
    name: &str,
    index: &TypeIndex,
) -> AccessContext {
    let (parent_type, owner_path) = resolve_expression(qualifier, index);
    let property_type = parent_type
        .as_deref()
        .and_then(|t| index.member_type(t, name))
        .map(str::to_string);
    AccessContext {
        property_name: name.to_string(),
        qualifier: Some(trailing_name(qualifier)),
        parent_type,
        owner_path,
        property_type,
    }
}

/// Context for an unqualified identifier, resolved through enclosing scopes.
pub(crate) fn bare_identifier_context(id: SyntaxNode<'_>, index: &TypeIndex) -> AccessContext {
    let name = id.text();
    match resolve_name(id, name, index) {
        Some(Binding::Variable(ty)) => AccessContext {
            property_name: name.to_string(),
            property_type: ty,
            ..AccessContext::default()
        },
        _ => {
            let owner = enclosing_type_name(id);
            let property_type = owner
                .as_deref()
                .and_then(|o| index.member_type(o, name))
                .map(str::to_string);
            AccessContext {
                property_name: name.to_string(),
                qualifier: None,
                owner_path: owner.iter().cloned().collect(),
                parent_type: owner,
                property_type,
            }
        }
    }
}

/// Context for `Name = value` inside `new T { ... }`.
pub(crate) fn initializer_context(
    creation: SyntaxNode<'_>,
    name: &str,
    index: &TypeIndex,
) -> AccessContext {
    let parent_type = creation.field("type").map(|t| t.text().to_string());
    let property_type = parent_type
        .as_deref()
        .and_then(|t| index.member_type(t, name))
        .map(str::to_string);
    AccessContext {
        property_name: name.to_string(),
        qualifier: None,
        owner_path: parent_type
            .iter()
            .map(|t| base_type(t).to_string())
            .collect(),
        parent_type,
        property_type,
    }
}
