use crate::syntax::{Rewrite, Rewriter, SyntaxNode, SyntaxTree};
use crate::transform::errors::{require_identifier, InputError, TransformError};
use crate::transform::operation::{EditOperation, OperationOutput, RenameKind};

/// Syntactic rename of a method, class, variable or property.
///
/// Matching is by name only. Two unrelated members sharing a name are
/// renamed together; there is no scope or overload resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOperation {
    kind: RenameKind,
    old_name: String,
    new_name: String,
}

impl RenameOperation {
    pub fn new(kind: RenameKind, old_name: &str, new_name: &str) -> Result<Self, InputError> {
        require_identifier("old name", old_name)?;
        require_identifier("new name", new_name)?;
        Ok(Self {
            kind,
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        })
    }
}

impl EditOperation for RenameOperation {
    fn description(&self) -> String {
        format!(
            "Rename {} '{}' to '{}'",
            self.kind, self.old_name, self.new_name
        )
    }

    fn execute(&self, text: &str) -> Result<OperationOutput, TransformError> {
        let tree = SyntaxTree::parse(text)?;
        let mut rewriter = RenameRewriter {
            op: self,
            renamed: 0,
        };
        let rewritten = tree.rewrite(&mut rewriter)?;

        if rewriter.renamed == 0 {
            return Err(TransformError::NotFound {
                kind: self.kind.to_string(),
                name: self.old_name.clone(),
            });
        }

        Ok(OperationOutput::new(
            rewritten.text,
            format!(
                "Renamed {} '{}' to '{}'",
                self.kind, self.old_name, self.new_name
            ),
        ))
    }
}

struct RenameRewriter<'a> {
    op: &'a RenameOperation,
    renamed: usize,
}

impl Rewriter for RenameRewriter<'_> {
    fn visit(&mut self, node: SyntaxNode<'_>) -> Rewrite {
        if node.ts_kind() != "identifier" || node.text() != self.op.old_name {
            return Rewrite::Descend;
        }

        let hit = match self.op.kind {
            RenameKind::Method => is_method_site(node),
            RenameKind::Class => is_class_site(node, &self.op.old_name),
            RenameKind::Variable | RenameKind::Property => true,
        };

        if hit {
            self.renamed += 1;
            Rewrite::Replace(self.op.new_name.clone())
        } else {
            Rewrite::Descend
        }
    }
}

fn is_name_of(parent: SyntaxNode<'_>, node: SyntaxNode<'_>) -> bool {
    parent.name_node() == Some(node)
}

/// Method declaration name, or the trailing identifier of a call's callee.
fn is_method_site(id: SyntaxNode<'_>) -> bool {
    let Some(parent) = id.parent() else {
        return false;
    };
    if parent.ts_kind() == "method_declaration" {
        return is_name_of(parent, id);
    }

    // Foo<T>() names the method through a generic_name
    let callee = if parent.ts_kind() == "generic_name" {
        parent
    } else {
        id
    };
    let Some(holder) = callee.parent() else {
        return false;
    };

    match holder.ts_kind() {
        "invocation_expression" => holder.field("function") == Some(callee),
        "member_access_expression" => {
            holder.field("name") == Some(callee)
                && holder.parent().is_some_and(|inv| {
                    inv.ts_kind() == "invocation_expression"
                        && inv.field("function") == Some(holder)
                })
        }
        "member_binding_expression" => holder.field("name") == Some(callee),
        _ => false,
    }
}

/// Class, constructor or finalizer name, or the type named by `new T(...)`.
fn is_class_site(id: SyntaxNode<'_>, class_name: &str) -> bool {
    let Some(parent) = id.parent() else {
        return false;
    };
    match parent.ts_kind() {
        "class_declaration" => return is_name_of(parent, id),
        "constructor_declaration" | "destructor_declaration" => {
            return is_name_of(parent, id)
                && parent
                    .containing_type()
                    .and_then(|t| t.name())
                    .is_some_and(|n| n == class_name);
        }
        _ => {}
    }

    // Climb generic and qualified wrappers while `id` stays the trailing name
    let mut ty = id;
    while let Some(p) = ty.parent() {
        let trailing = match p.ts_kind() {
            "generic_name" => true,
            "qualified_name" => p.field("name") == Some(ty),
            _ => false,
        };
        if !trailing {
            break;
        }
        ty = p;
    }

    ty.parent().is_some_and(|p| {
        p.ts_kind() == "object_creation_expression" && p.field("type") == Some(ty)
    })
}
