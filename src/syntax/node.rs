//! Borrowed node views over a parsed C# tree.
//!
//! [`SyntaxNode`] pairs a tree-sitter node with the source it was parsed
//! from and exposes the handful of C#-specific facts the query, transform
//! and mapping engines need (declared names, modifiers, attributes, return
//! types, parameters, base lists, bodies and enclosing scopes).

use std::fmt;
use tree_sitter::Node;

/// Closed classification of the constructs the engines care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Class,
    Method,
    Field,
    Property,
    Statement(StatementKind),
    Expression(ExpressionKind),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    If,
    For,
    ForEach,
    While,
    DoWhile,
    Switch,
    Try,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    MemberAccess,
    Identifier,
    Invocation,
    Literal,
    ObjectCreation,
}

impl NodeKind {
    /// Classify a tree-sitter grammar kind.
    pub fn from_grammar(kind: &str) -> Self {
        match kind {
            "class_declaration" => NodeKind::Class,
            "method_declaration" => NodeKind::Method,
            "field_declaration" => NodeKind::Field,
            "property_declaration" => NodeKind::Property,
            "if_statement" => NodeKind::Statement(StatementKind::If),
            "for_statement" => NodeKind::Statement(StatementKind::For),
            "foreach_statement" => NodeKind::Statement(StatementKind::ForEach),
            "while_statement" => NodeKind::Statement(StatementKind::While),
            "do_statement" => NodeKind::Statement(StatementKind::DoWhile),
            "switch_statement" => NodeKind::Statement(StatementKind::Switch),
            "try_statement" => NodeKind::Statement(StatementKind::Try),
            "return_statement" => NodeKind::Statement(StatementKind::Return),
            "member_access_expression" => NodeKind::Expression(ExpressionKind::MemberAccess),
            "identifier" => NodeKind::Expression(ExpressionKind::Identifier),
            "invocation_expression" => NodeKind::Expression(ExpressionKind::Invocation),
            "object_creation_expression" => NodeKind::Expression(ExpressionKind::ObjectCreation),
            k if is_literal_kind(k) => NodeKind::Expression(ExpressionKind::Literal),
            _ => NodeKind::Other,
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(self, NodeKind::Statement(_))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, NodeKind::Expression(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Class => write!(f, "class"),
            NodeKind::Method => write!(f, "method"),
            NodeKind::Field => write!(f, "field"),
            NodeKind::Property => write!(f, "property"),
            NodeKind::Statement(s) => write!(f, "{s} statement"),
            NodeKind::Expression(e) => write!(f, "{e} expression"),
            NodeKind::Other => write!(f, "node"),
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatementKind::If => "if",
            StatementKind::For => "for",
            StatementKind::ForEach => "foreach",
            StatementKind::While => "while",
            StatementKind::DoWhile => "do-while",
            StatementKind::Switch => "switch",
            StatementKind::Try => "try",
            StatementKind::Return => "return",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ExpressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExpressionKind::MemberAccess => "member-access",
            ExpressionKind::Identifier => "identifier",
            ExpressionKind::Invocation => "invocation",
            ExpressionKind::Literal => "literal",
            ExpressionKind::ObjectCreation => "object-creation",
        };
        f.write_str(s)
    }
}

pub(crate) fn is_literal_kind(kind: &str) -> bool {
    matches!(
        kind,
        "integer_literal"
            | "real_literal"
            | "string_literal"
            | "verbatim_string_literal"
            | "raw_string_literal"
            | "character_literal"
            | "boolean_literal"
            | "null_literal"
            | "interpolated_string_expression"
    )
}

/// Grammar kinds that introduce a type declaration.
pub(crate) fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "struct_declaration"
            | "interface_declaration"
            | "record_declaration"
            | "record_struct_declaration"
            | "enum_declaration"
    )
}

/// Grammar kinds that own a callable body.
pub(crate) fn is_callable(kind: &str) -> bool {
    matches!(
        kind,
        "method_declaration"
            | "constructor_declaration"
            | "destructor_declaration"
            | "local_function_statement"
            | "operator_declaration"
            | "conversion_operator_declaration"
            | "accessor_declaration"
    )
}

/// Nested function-like constructs whose `return`s belong to themselves.
pub(crate) fn is_nested_function(kind: &str) -> bool {
    matches!(
        kind,
        "local_function_statement" | "lambda_expression" | "anonymous_method_expression"
    )
}

const ACCESSIBILITY: [&str; 4] = ["public", "private", "protected", "internal"];

/// A grammar node plus the source text it spans.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    node: Node<'t>,
    source: &'t str,
}

impl<'t> SyntaxNode<'t> {
    pub(crate) fn new(node: Node<'t>, source: &'t str) -> Self {
        Self { node, source }
    }

    fn wrap(&self, node: Node<'t>) -> Self {
        Self::new(node, self.source)
    }

    /// The underlying tree-sitter node.
    pub fn raw(&self) -> Node<'t> {
        self.node
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::from_grammar(self.node.kind())
    }

    /// Grammar kind as named by tree-sitter-c-sharp.
    pub fn ts_kind(&self) -> &'static str {
        self.node.kind()
    }

    pub fn id(&self) -> usize {
        self.node.id()
    }

    pub fn byte_start(&self) -> usize {
        self.node.start_byte()
    }

    pub fn byte_end(&self) -> usize {
        self.node.end_byte()
    }

    pub fn span(&self) -> (usize, usize) {
        (self.byte_start(), self.byte_end())
    }

    /// 1-based line of the node start.
    pub fn line(&self) -> usize {
        self.node.start_position().row + 1
    }

    pub fn text(&self) -> &'t str {
        self.source
            .get(self.byte_start()..self.byte_end())
            .unwrap_or_default()
    }

    pub fn source(&self) -> &'t str {
        self.source
    }

    pub fn is_named(&self) -> bool {
        self.node.is_named()
    }

    pub fn parent(&self) -> Option<Self> {
        self.node.parent().map(|n| self.wrap(n))
    }

    pub fn ancestors(&self) -> Ancestors<'t> {
        Ancestors {
            current: self.parent(),
        }
    }

    pub fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|n| self.wrap(n))
            .collect()
    }

    pub fn named_children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .map(|n| self.wrap(n))
            .collect()
    }

    /// First named child that is not a comment.
    pub fn first_named_child(&self) -> Option<Self> {
        let mut cursor = self.node.walk();
        let first = self
            .node
            .named_children(&mut cursor)
            .find(|n| !n.is_extra());
        first.map(|n| self.wrap(n))
    }

    pub fn field(&self, name: &str) -> Option<Self> {
        self.node.child_by_field_name(name).map(|n| self.wrap(n))
    }

    /// Pre-order walk of this subtree, including `self`.
    pub fn descendants(&self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children = node.children();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Whether `other` lies inside this node's span.
    pub fn contains(&self, other: &SyntaxNode<'_>) -> bool {
        self.byte_start() <= other.byte_start() && other.byte_end() <= self.byte_end()
    }

    /// Declared identifier of a declaration node.
    pub fn name(&self) -> Option<&'t str> {
        if let Some(name) = self.field("name") {
            return Some(name.text());
        }
        // variable_declarator in some grammar versions has no `name` field
        if self.ts_kind() == "variable_declarator" {
            return self
                .named_children()
                .into_iter()
                .find(|c| c.ts_kind() == "identifier")
                .map(|c| c.text());
        }
        None
    }

    /// Span of the declared identifier.
    pub fn name_node(&self) -> Option<Self> {
        self.field("name").or_else(|| {
            (self.ts_kind() == "variable_declarator")
                .then(|| {
                    self.named_children()
                        .into_iter()
                        .find(|c| c.ts_kind() == "identifier")
                })
                .flatten()
        })
    }

    /// Modifier keywords in declaration order (`public`, `static`, ...).
    pub fn modifiers(&self) -> Vec<&'t str> {
        let owner = self.declaration_owner();
        let mut mods = Vec::new();
        for child in owner.children() {
            if child.ts_kind() == "modifier" {
                mods.push(child.text().trim());
            }
        }
        mods
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers().iter().any(|m| *m == modifier)
    }

    /// True when no accessibility modifier is written.
    pub fn has_default_accessibility(&self) -> bool {
        !self
            .modifiers()
            .iter()
            .any(|m| ACCESSIBILITY.contains(m))
    }

    /// Names of applied attributes, without the argument list.
    pub fn attributes(&self) -> Vec<&'t str> {
        let owner = self.declaration_owner();
        let mut names = Vec::new();
        for list in owner.children() {
            if list.ts_kind() != "attribute_list" {
                continue;
            }
            for attr in list.named_children() {
                if attr.ts_kind() != "attribute" {
                    continue;
                }
                if let Some(name) = attr.field("name") {
                    names.push(name.text());
                } else if let Some(first) = attr.first_named_child() {
                    names.push(first.text());
                }
            }
        }
        names
    }

    /// Printed return type of a method-like declaration.
    pub fn return_type(&self) -> Option<&'t str> {
        self.return_type_node().map(|n| n.text())
    }

    pub fn return_type_node(&self) -> Option<Self> {
        match self.ts_kind() {
            "method_declaration" | "local_function_statement" | "delegate_declaration" => {
                self.field("returns").or_else(|| self.field("type"))
            }
            _ => None,
        }
    }

    /// Declared type of a field, property, local or parameter.
    pub fn declared_type(&self) -> Option<&'t str> {
        match self.ts_kind() {
            "property_declaration" | "parameter" | "variable_declaration" => {
                self.field("type").map(|t| t.text())
            }
            "field_declaration" | "local_declaration_statement" | "event_field_declaration" => self
                .child_of_kind("variable_declaration")
                .and_then(|d| d.field("type"))
                .map(|t| t.text()),
            "variable_declarator" => self
                .parent()
                .filter(|p| p.ts_kind() == "variable_declaration")
                .and_then(|p| p.field("type"))
                .map(|t| t.text()),
            _ => None,
        }
    }

    /// Parameters of a callable declaration as `(type, name)` pairs.
    pub fn parameters(&self) -> Vec<Parameter<'t>> {
        let Some(list) = self
            .field("parameters")
            .or_else(|| self.child_of_kind("parameter_list"))
        else {
            return Vec::new();
        };
        list.named_children()
            .into_iter()
            .filter(|p| p.ts_kind() == "parameter")
            .map(|p| Parameter {
                type_name: p.field("type").map(|t| t.text()).unwrap_or_default(),
                name: p.name().unwrap_or_default(),
                modifiers: p
                    .children()
                    .into_iter()
                    .filter(|c| matches!(c.ts_kind(), "modifier" | "parameter_modifier"))
                    .map(|c| c.text())
                    .collect(),
            })
            .collect()
    }

    /// Printed base-type list without the leading colon.
    pub fn base_types(&self) -> Option<&'t str> {
        let base = self
            .field("bases")
            .or_else(|| self.child_of_kind("base_list"))?;
        Some(base.text().trim_start_matches(':').trim())
    }

    /// Block or expression body of a callable.
    pub fn body(&self) -> Option<Self> {
        self.field("body").or_else(|| {
            self.children()
                .into_iter()
                .find(|c| matches!(c.ts_kind(), "block" | "arrow_expression_clause"))
        })
    }

    /// Block body only; `None` for abstract or expression-bodied members.
    pub fn block_body(&self) -> Option<Self> {
        self.body().filter(|b| b.ts_kind() == "block")
    }

    /// Dotted name of the containing namespace chain, outermost first.
    pub fn namespace(&self) -> Option<String> {
        let mut parts = Vec::new();
        for ancestor in self.ancestors() {
            if matches!(
                ancestor.ts_kind(),
                "namespace_declaration" | "file_scoped_namespace_declaration"
            ) {
                if let Some(name) = ancestor.name() {
                    parts.push(name.to_string());
                }
            }
        }
        if parts.is_empty() {
            // File-scoped namespaces may be siblings of the declarations they cover
            let root = self.ancestors().last()?;
            let ns = root.children().into_iter().find(|c| {
                c.ts_kind() == "file_scoped_namespace_declaration"
                    && c.byte_start() <= self.byte_start()
            })?;
            return ns.name().map(str::to_string);
        }
        parts.reverse();
        Some(parts.join("."))
    }

    /// Nearest enclosing type declaration.
    pub fn containing_type(&self) -> Option<Self> {
        self.ancestors().find(|a| is_type_declaration(a.ts_kind()))
    }

    /// Nearest enclosing method, constructor, accessor or local function.
    pub fn containing_callable(&self) -> Option<Self> {
        self.ancestors().find(|a| is_callable(a.ts_kind()))
    }

    /// Nearest enclosing `method_declaration`.
    pub fn containing_method(&self) -> Option<Self> {
        self.ancestors()
            .find(|a| a.ts_kind() == "method_declaration")
    }

    pub fn child_of_kind(&self, kind: &str) -> Option<Self> {
        self.children().into_iter().find(|c| c.ts_kind() == kind)
    }

    /// Leading indentation of the line this node starts on.
    pub fn indentation(&self) -> &'t str {
        let line_start = self.source[..self.byte_start()]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line = &self.source[line_start..];
        let end = line
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(line.len());
        &line[..end]
    }

    /// Declarators own no modifiers; climb to the declaration that does.
    fn declaration_owner(&self) -> Self {
        if self.ts_kind() == "variable_declarator" {
            if let Some(decl) = self
                .parent()
                .filter(|p| p.ts_kind() == "variable_declaration")
                .and_then(|p| p.parent())
            {
                return decl;
            }
        }
        *self
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{}",
            self.ts_kind(),
            self.byte_start(),
            self.byte_end()
        )
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for SyntaxNode<'_> {}

pub struct Ancestors<'t> {
    current: Option<SyntaxNode<'t>>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current?;
        self.current = node.parent();
        Some(node)
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter<'t> {
    pub type_name: &'t str,
    pub name: &'t str,
    pub modifiers: Vec<&'t str>,
}
