use crate::edit::Edit;
use crate::syntax::node::SyntaxNode;

/// Decision taken by a [`Rewriter`] for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// Keep the node and visit its children.
    Descend,
    /// Replace the whole subtree with new text; children are not visited.
    Replace(String),
    /// Keep the subtree untouched without visiting it.
    Skip,
}

/// A fold over the syntax tree.
///
/// `visit` is called once per node in document order. The default pass is
/// [`Rewrite::Descend`], so implementors only handle the kinds they care
/// about and let everything else through.
pub trait Rewriter {
    fn visit(&mut self, node: SyntaxNode<'_>) -> Rewrite;

    /// Called after all children of a descended node have been visited.
    fn leave(&mut self, _node: SyntaxNode<'_>) {}
}

/// Text produced by [`crate::syntax::SyntaxTree::rewrite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub replacements: usize,
}

/// Walk `root` once and collect the replacement edits.
pub(crate) fn fold<R: Rewriter + ?Sized>(root: SyntaxNode<'_>, rewriter: &mut R) -> Vec<Edit> {
    let mut edits = Vec::new();
    fold_node(root, rewriter, &mut edits);
    edits
}

fn fold_node<R: Rewriter + ?Sized>(node: SyntaxNode<'_>, rewriter: &mut R, edits: &mut Vec<Edit>) {
    match rewriter.visit(node) {
        Rewrite::Replace(new_text) => {
            edits.push(Edit::new(
                node.byte_start(),
                node.byte_end(),
                new_text,
                node.text(),
            ));
        }
        Rewrite::Skip => {}
        Rewrite::Descend => {
            for child in node.children() {
                fold_node(child, rewriter, edits);
            }
            rewriter.leave(node);
        }
    }
}
