use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::{DomainTree, Leaf, NodeId, NodeKind};
use crate::domain::operators::ValueMode;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// Human readable leaf: `label operator-label [value]`.
pub fn leaf_label(leaf: &Leaf) -> String {
    match leaf.operator.value_mode {
        ValueMode::None => format!("{} {}", leaf.field.label, leaf.operator.label),
        _ => format!("{} {} {}", leaf.field.label, leaf.operator.label, leaf.value),
    }
}

fn build_tree(tree: &DomainTree, node_idx: NodeId) -> Option<Tree<String>> {
    let node = tree.get_node(node_idx)?;
    let rendered = match &node.kind {
        NodeKind::Leaf(leaf) => Tree::new(leaf_label(leaf)),
        NodeKind::Branch(branch) => Tree::new(branch.connective.to_string()).with_leaves(
            branch
                .children
                .iter()
                .filter_map(|&child| build_tree(tree, child)),
        ),
    };
    Some(rendered)
}

impl TreeNodeConvert for DomainTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        if self.is_empty() {
            return Tree::new("Empty domain".to_string());
        }
        build_tree(self, self.root()).unwrap_or_else(|| Tree::new("Empty domain".to_string()))
    }
}
