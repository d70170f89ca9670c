//! Structural and leaf edits on a [`DomainTree`].
//!
//! Edits never fail: an id that does not address a node of the expected
//! kind turns the call into a no-op and the method returns `false`.

use tracing::{debug, instrument, trace};

use crate::domain::arena::{Branch, DomainTree, Leaf, NodeId, NodeKind};
use crate::domain::ast::{Connective, FieldPath};
use crate::domain::editors::{default_field_value, default_value};
use crate::domain::field::FieldDef;
use crate::domain::operators::{default_operator, Operator, ValueMode};
use crate::domain::value::Value;

/// Reshape a leaf value when its operator changes value mode.
pub fn migrate_value(field: &FieldDef, from: ValueMode, to: &Operator, value: Value) -> Value {
    match (from, to.value_mode) {
        (from, to_mode) if from == to_mode => value,
        (_, ValueMode::None) => Value::ABSENT,
        (ValueMode::None, _) => default_value(field, to),
        (ValueMode::Single, ValueMode::Multiple) => Value::List(vec![value]),
        (ValueMode::Multiple, ValueMode::Single) => match value {
            Value::List(items) => items
                .into_iter()
                .next()
                .unwrap_or_else(|| default_field_value(field)),
            other => other,
        },
        (_, _) => value,
    }
}

impl DomainTree {
    /// Detached leaf on `field` with the type's default operator and value.
    ///
    /// Detached nodes live in the arena until attached or [`discard`]ed;
    /// callers discard the ones they end up not using.
    ///
    /// [`discard`]: DomainTree::discard
    pub fn new_leaf(&mut self, field: FieldDef) -> NodeId {
        let operator = default_operator(field.field_type);
        let value = default_value(&field, operator);
        self.new_leaf_with(field, operator, value)
    }

    pub fn new_leaf_with(&mut self, field: FieldDef, operator: &'static Operator, value: Value) -> NodeId {
        let path = FieldPath::Path(field.name.clone());
        self.insert_node(
            NodeKind::Leaf(Leaf {
                path,
                field,
                operator,
                value,
            }),
            None,
        )
    }

    /// Detached empty branch.
    pub fn new_branch(&mut self, connective: Connective) -> NodeId {
        self.insert_node(NodeKind::branch(connective), None)
    }

    /// Append `node` to `branch`'s children.
    #[instrument(level = "debug", skip(self))]
    pub fn add(&mut self, branch: NodeId, node: NodeId) -> bool {
        let len = self.children(branch).len();
        self.attach(branch, len, node)
    }

    /// Insert `node` right after the direct child `sibling` of `branch`.
    #[instrument(level = "debug", skip(self))]
    pub fn insert_after(&mut self, branch: NodeId, sibling: NodeId, node: NodeId) -> bool {
        match self.children(branch).iter().position(|&c| c == sibling) {
            Some(pos) => self.attach(branch, pos + 1, node),
            None => {
                trace!("{sibling} is not a child of {branch}");
                false
            }
        }
    }

    /// Insert after `sibling` a branch of the opposite connective holding
    /// two default leaves on the id field.
    #[instrument(level = "debug", skip(self))]
    pub fn insert_branch_after(&mut self, branch: NodeId, sibling: NodeId) -> Option<NodeId> {
        let connective = self.branch(branch)?.connective;
        if connective == Connective::Not || !self.children(branch).contains(&sibling) {
            return None;
        }
        let nested = self.new_branch(connective.opposite());
        for _ in 0..2 {
            let leaf = self.new_leaf(FieldDef::id());
            self.attach(nested, self.children(nested).len(), leaf);
        }
        self.insert_after(branch, sibling, nested);
        Some(nested)
    }

    /// Remove the direct child `node` of `branch` with its subtree.
    ///
    /// A non-root branch left without children is removed from its parent,
    /// recursively. With `collapse_single_child` set, a non-root AND/OR
    /// branch left with one child is replaced by that child.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, branch: NodeId, node: NodeId) -> bool {
        if !self.children(branch).contains(&node) {
            return false;
        }
        self.unlink(node);
        self.discard(node);

        let mut current = branch;
        while current != self.root() && self.children(current).is_empty() {
            let Some(parent) = self.parent(current) else {
                break;
            };
            debug!("splicing out empty branch {current}");
            self.unlink(current);
            self.remove_node(current);
            current = parent;
        }

        if self.collapse_single_child {
            self.collapse(current);
        }
        true
    }

    fn collapse(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let Some(Branch {
            connective,
            children,
        }) = self.branch(id)
        else {
            return;
        };
        if *connective == Connective::Not || children.len() != 1 {
            return;
        }
        let only = children[0];
        let Some(pos) = self.children(parent).iter().position(|&c| c == id) else {
            return;
        };
        debug!("collapsing single-child branch {id} into {only}");

        let parent_connective = self.branch(parent).map(|b| b.connective);
        let flatten = matches!(
            self.branch(only),
            Some(b) if Some(b.connective) == parent_connective && b.connective != Connective::Not
        );
        let merged = if flatten {
            self.children(only).to_vec()
        } else {
            vec![only]
        };

        for &child in &merged {
            if let Some(node) = self.get_node_mut(child) {
                node.parent = Some(parent);
            }
        }
        if let Some(NodeKind::Branch(b)) = self.get_kind_mut(parent) {
            b.children.splice(pos..=pos, merged.iter().copied());
        }
        self.remove_node(id);
        if flatten {
            self.remove_node(only);
        }
    }

    /// Deep copy of the subtree at `id` with fresh ids, detached until added
    /// (or [`discard`](DomainTree::discard)ed).
    #[instrument(level = "debug", skip(self))]
    pub fn clone_node(&mut self, id: NodeId) -> Option<NodeId> {
        let kind = self.get_node(id)?.kind.clone();
        match kind {
            NodeKind::Leaf(leaf) => Some(self.insert_node(NodeKind::Leaf(leaf), None)),
            NodeKind::Branch(branch) => {
                let copy = self.new_branch(branch.connective);
                for child in branch.children {
                    if let Some(child_copy) = self.clone_node(child) {
                        self.attach(copy, self.children(copy).len(), child_copy);
                    }
                }
                Some(copy)
            }
        }
    }

    /// Drop a node and everything below it from the arena.
    pub fn discard(&mut self, id: NodeId) {
        if id == self.root() {
            return;
        }
        self.unlink(id);
        let ids: Vec<NodeId> = self.iter_from(id).map(|(node_id, _)| node_id).collect();
        for node_id in ids {
            self.remove_node(node_id);
        }
    }

    /// Point a leaf at another field, resetting operator and value to the
    /// defaults of the new field type.
    #[instrument(level = "debug", skip(self, field), fields(field = %field.name))]
    pub fn update_field(&mut self, id: NodeId, field: FieldDef) -> bool {
        let Some(NodeKind::Leaf(leaf)) = self.get_kind_mut(id) else {
            return false;
        };
        let operator = default_operator(field.field_type);
        leaf.value = default_value(&field, operator);
        leaf.operator = operator;
        leaf.path = FieldPath::Path(field.name.clone());
        leaf.field = field;
        true
    }

    /// Change a leaf's operator, migrating its value to the new value mode.
    #[instrument(level = "debug", skip(self, operator), fields(operator = operator.key))]
    pub fn update_leaf_operator(&mut self, id: NodeId, operator: &'static Operator) -> bool {
        let Some(NodeKind::Leaf(leaf)) = self.get_kind_mut(id) else {
            return false;
        };
        let value = std::mem::replace(&mut leaf.value, Value::ABSENT);
        leaf.value = migrate_value(&leaf.field, leaf.operator.value_mode, operator, value);
        leaf.operator = operator;
        true
    }

    pub fn update_leaf_value(&mut self, id: NodeId, value: Value) -> bool {
        let Some(NodeKind::Leaf(leaf)) = self.get_kind_mut(id) else {
            return false;
        };
        leaf.value = value;
        true
    }

    /// Switch a branch's connective. NOT is only accepted on a non-root
    /// branch with exactly one child.
    #[instrument(level = "debug", skip(self))]
    pub fn set_connective(&mut self, id: NodeId, connective: Connective) -> bool {
        if connective == Connective::Not && (id == self.root() || self.children(id).len() != 1) {
            return false;
        }
        let Some(NodeKind::Branch(branch)) = self.get_kind_mut(id) else {
            return false;
        };
        branch.connective = connective;
        true
    }

    /// Place `node` at `pos` among `branch`'s children, detaching it first.
    ///
    /// A NOT branch takes a child only while it has none.
    fn attach(&mut self, branch: NodeId, pos: usize, node: NodeId) -> bool {
        if node == self.root() || !self.contains(node) {
            return false;
        }
        match self.branch(branch) {
            None => return false,
            Some(b) if b.connective == Connective::Not && !b.children.is_empty() => {
                trace!("NOT branch {branch} already holds its operand");
                return false;
            }
            Some(_) => {}
        }
        if self.iter_from(node).any(|(id, _)| id == branch) {
            trace!("refusing to attach {node} below itself");
            return false;
        }
        self.unlink(node);
        if let Some(NodeKind::Branch(b)) = self.get_kind_mut(branch) {
            let pos = pos.min(b.children.len());
            b.children.insert(pos, node);
        }
        if let Some(n) = self.get_node_mut(node) {
            n.parent = Some(branch);
        }
        true
    }

    /// Remove `node` from its parent's children, leaving it detached.
    fn unlink(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(NodeKind::Branch(b)) = self.get_kind_mut(parent) {
            b.children.retain(|&c| c != node);
        }
        if let Some(n) = self.get_node_mut(node) {
            n.parent = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::FieldType;
    use crate::domain::operators::find_operator;

    fn age() -> FieldDef {
        FieldDef::new("age", FieldType::Integer)
    }

    #[test]
    fn given_single_to_multiple_then_wraps_value() {
        let op = find_operator("in").unwrap();
        assert_eq!(
            migrate_value(&age(), ValueMode::Single, op, Value::Int(10)),
            Value::List(vec![Value::Int(10)])
        );
    }

    #[test]
    fn given_empty_multiple_to_single_then_type_default() {
        let op = find_operator("=").unwrap();
        assert_eq!(
            migrate_value(&age(), ValueMode::Multiple, op, Value::List(vec![])),
            Value::Int(1)
        );
    }

    #[test]
    fn given_none_to_single_then_type_default() {
        let op = find_operator(">").unwrap();
        assert_eq!(
            migrate_value(&age(), ValueMode::None, op, Value::ABSENT),
            Value::Int(1)
        );
    }

    #[test]
    fn given_none_to_multiple_then_empty_list() {
        let op = find_operator("not in").unwrap();
        assert_eq!(
            migrate_value(&age(), ValueMode::None, op, Value::ABSENT),
            Value::List(vec![])
        );
    }

    #[test]
    fn given_same_mode_then_value_kept() {
        let op = find_operator(">=").unwrap();
        assert_eq!(
            migrate_value(&age(), ValueMode::Single, op, Value::Int(7)),
            Value::Int(7)
        );
    }

    #[test]
    fn given_detached_node_when_adding_to_itself_then_refused() {
        let mut tree = DomainTree::new();
        let branch = tree.new_branch(Connective::Or);
        assert!(!tree.add(branch, branch));
        assert!(tree.children(branch).is_empty());
    }

    #[test]
    fn given_root_when_setting_not_then_refused() {
        let mut tree = DomainTree::new();
        let root = tree.root();
        let leaf = tree.new_leaf(age());
        tree.add(root, leaf);
        assert!(!tree.set_connective(root, Connective::Not));
        assert!(tree.set_connective(root, Connective::Or));
        assert_eq!(tree.root_connective(), Connective::Or);
    }
}
