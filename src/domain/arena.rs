use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::ast::{Connective, FieldPath};
use crate::domain::field::FieldDef;
use crate::domain::operators::Operator;
use crate::domain::value::Value;

/// Stable identity of a node.
///
/// Wraps a generational index: a slot freed by a delete is handed out again
/// with a new generation, so an id never compares equal to an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{slot}.{generation}")
    }
}

/// Logical connective over child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub connective: Connective,
    pub children: Vec<NodeId>,
}

/// Field comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub path: FieldPath,
    pub field: FieldDef,
    pub operator: &'static Operator,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Branch(Branch),
    Leaf(Leaf),
}

impl NodeKind {
    pub fn branch(connective: Connective) -> Self {
        NodeKind::Branch(Branch {
            connective,
            children: Vec::new(),
        })
    }
}

/// Node in the arena-based domain tree.
#[derive(Debug)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// Parent branch, None for the root and for detached nodes
    pub parent: Option<NodeId>,
}

impl TreeNode {
    pub fn as_branch(&self) -> Option<&Branch> {
        match &self.kind {
            NodeKind::Branch(b) => Some(b),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(l) => Some(l),
            NodeKind::Branch(_) => None,
        }
    }
}

/// Id-free structural view of a subtree, for equality checks across rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeShape {
    Leaf {
        path: FieldPath,
        operator: &'static str,
        value: Value,
    },
    Branch {
        connective: Connective,
        children: Vec<NodeShape>,
    },
}

/// Editable domain tree.
///
/// Nodes live in a generational arena owned by the tree. The root is always
/// a branch; an empty root stands for the empty domain. Nodes created by
/// `new_leaf`, `new_branch` or `clone_node` stay detached until added to a
/// branch.
#[derive(Debug)]
pub struct DomainTree {
    arena: Arena<TreeNode>,
    root: NodeId,
    /// Replace a branch left with a single child by that child on delete
    pub(crate) collapse_single_child: bool,
}

impl Default for DomainTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainTree {
    /// Empty domain: an AND root without children.
    pub fn new() -> Self {
        Self::with_root(Connective::And)
    }

    pub fn with_root(connective: Connective) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(TreeNode {
            kind: NodeKind::branch(connective),
            parent: None,
        }));
        Self {
            arena,
            root,
            collapse_single_child: false,
        }
    }

    pub fn collapse_single_child(mut self, collapse: bool) -> Self {
        self.collapse_single_child = collapse;
        self
    }

    /// Insert a node, appending it to `parent`'s children when given.
    #[instrument(level = "trace", skip(self, kind))]
    pub(crate) fn insert_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let node_idx = NodeId(self.arena.insert(TreeNode { kind, parent }));

        if let Some(parent_idx) = parent {
            if let Some(NodeKind::Branch(branch)) = self.get_kind_mut(parent_idx) {
                branch.children.push(node_idx);
            }
        }

        node_idx
    }

    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<TreeNode> {
        self.arena.remove(id.0)
    }

    pub fn get_node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id.0)
    }

    pub(crate) fn get_node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(id.0)
    }

    pub(crate) fn get_kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.arena.get_mut(id.0).map(|node| &mut node.kind)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_connective(&self) -> Connective {
        self.branch(self.root)
            .map(|b| b.connective)
            .unwrap_or(Connective::And)
    }

    pub fn branch(&self, id: NodeId) -> Option<&Branch> {
        self.get_node(id).and_then(TreeNode::as_branch)
    }

    pub fn leaf(&self, id: NodeId) -> Option<&Leaf> {
        self.get_node(id).and_then(TreeNode::as_leaf)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.branch(id).map(|b| b.children.as_slice()).unwrap_or(&[])
    }

    /// True for the empty domain.
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Number of nodes reachable from the root, root included.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order traversal from the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order traversal of the subtree at `id`.
    pub fn iter_from(&self, id: NodeId) -> TreeIterator<'_> {
        TreeIterator::new(self, id)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, self.root)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: NodeId) -> usize {
        if self.get_node(node_idx).is_none() {
            return 0;
        }
        1 + self
            .children(node_idx)
            .iter()
            .map(|&child| self.calculate_depth(child))
            .max()
            .unwrap_or(0)
    }

    /// Ids of all leaves, left to right.
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.as_leaf().is_some())
            .map(|(id, _)| id)
            .collect()
    }

    /// Structural view of the subtree at `id`.
    pub fn shape(&self, id: NodeId) -> Option<NodeShape> {
        match &self.get_node(id)?.kind {
            NodeKind::Leaf(leaf) => Some(NodeShape::Leaf {
                path: leaf.path.clone(),
                operator: leaf.operator.key,
                value: leaf.value.clone(),
            }),
            NodeKind::Branch(branch) => Some(NodeShape::Branch {
                connective: branch.connective,
                children: branch
                    .children
                    .iter()
                    .filter_map(|&child| self.shape(child))
                    .collect(),
            }),
        }
    }

    /// Structural view of the whole tree.
    pub fn structure(&self) -> NodeShape {
        self.shape(self.root).unwrap_or(NodeShape::Branch {
            connective: Connective::And,
            children: Vec::new(),
        })
    }
}

pub struct TreeIterator<'a> {
    tree: &'a DomainTree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a DomainTree, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                if let Some(branch) = node.as_branch() {
                    self.stack.extend(branch.children.iter().rev());
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a DomainTree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a DomainTree, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![(start, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    if let Some(branch) = node.as_branch() {
                        for &child in branch.children.iter().rev() {
                            self.stack.push((child, false));
                        }
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operators::find_operator;

    fn leaf_kind(path: &str) -> NodeKind {
        NodeKind::Leaf(Leaf {
            path: FieldPath::from(path),
            field: FieldDef::new(path, crate::domain::field::FieldType::Integer),
            operator: find_operator("=").unwrap(),
            value: Value::Int(1),
        })
    }

    //      AND
    //     /   \
    //    a    OR
    //        /  \
    //       b    c
    fn sample_tree() -> DomainTree {
        let mut tree = DomainTree::new();
        let root = tree.root();
        tree.insert_node(leaf_kind("a"), Some(root));
        let or = tree.insert_node(NodeKind::branch(Connective::Or), Some(root));
        tree.insert_node(leaf_kind("b"), Some(or));
        tree.insert_node(leaf_kind("c"), Some(or));
        tree
    }

    fn paths(tree: &DomainTree, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| match tree.leaf(id) {
            Some(leaf) => leaf.field.name.clone(),
            None => tree.branch(id).unwrap().connective.to_string(),
        })
        .collect()
    }

    #[test]
    fn given_new_tree_then_root_is_empty_and_branch() {
        let tree = DomainTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.root_connective(), Connective::And);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn given_tree_when_iterating_then_preorder_left_to_right() {
        let tree = sample_tree();
        let order = paths(&tree, tree.iter().map(|(id, _)| id));
        assert_eq!(order, vec!["AND", "a", "OR", "b", "c"]);
    }

    #[test]
    fn given_tree_when_iterating_postorder_then_children_first() {
        let tree = sample_tree();
        let order = paths(&tree, tree.iter_postorder().map(|(id, _)| id));
        assert_eq!(order, vec!["a", "b", "c", "OR", "AND"]);
    }

    #[test]
    fn given_tree_then_depth_and_leaves() {
        let tree = sample_tree();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaf_nodes().len(), 3);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn given_removed_node_when_inserting_again_then_id_differs() {
        let mut tree = DomainTree::new();
        let first = tree.insert_node(leaf_kind("a"), None);
        tree.remove_node(first);
        let second = tree.insert_node(leaf_kind("a"), None);
        assert_ne!(first, second);
        assert!(!tree.contains(first));
    }
}
