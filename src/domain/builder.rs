//! Tree builder: turns a parsed [`Domain`] into an editable [`DomainTree`],
//! and serializes a tree back into a [`Domain`].

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::arena::{DomainTree, Leaf, NodeId, NodeKind};
use crate::domain::ast::{Condition, Connective, Domain, Expr, FieldPath};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::field::FieldDef;
use crate::domain::operators::{resolve_operator, ValueMode};
use crate::domain::value::Value;

/// Field definitions keyed by path; `None` marks a path that did not resolve.
pub type FieldDefs = HashMap<String, Option<FieldDef>>;

/// Constructs domain trees from parsed domains.
pub struct TreeBuilder<'a> {
    field_defs: &'a FieldDefs,
    collapse_single_child: bool,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(field_defs: &'a FieldDefs) -> Self {
        Self {
            field_defs,
            collapse_single_child: false,
        }
    }

    /// Delete policy carried by the built tree.
    pub fn collapse_single_child(mut self, collapse: bool) -> Self {
        self.collapse_single_child = collapse;
        self
    }

    /// Build the tree for a domain.
    ///
    /// Any unresolved field or unmatched operator fails the whole build.
    /// Operands with the same AND/OR connective as their parent are
    /// flattened into the parent.
    #[instrument(level = "debug", skip(self, domain))]
    pub fn build(&self, domain: &Domain) -> DomainResult<DomainTree> {
        let (root_connective, top) = match domain.root() {
            None => (Connective::And, Vec::new()),
            Some(Expr::Branch {
                connective: connective @ (Connective::And | Connective::Or),
                operands,
            }) => (*connective, operands.iter().collect()),
            Some(expr) => (Connective::And, vec![expr]),
        };

        let mut tree =
            DomainTree::with_root(root_connective).collapse_single_child(self.collapse_single_child);
        let root = tree.root();

        // Reverse push so that pops come out left to right
        let mut stack: Vec<(&Expr, NodeId)> = top.into_iter().rev().map(|e| (e, root)).collect();

        while let Some((expr, parent_idx)) = stack.pop() {
            match expr {
                Expr::Condition(cond) => {
                    let leaf = self.build_leaf(cond)?;
                    tree.insert_node(NodeKind::Leaf(leaf), Some(parent_idx));
                }
                Expr::Branch {
                    connective,
                    operands,
                } => {
                    let parent_connective = tree.branch(parent_idx).map(|b| b.connective);
                    let target = if *connective != Connective::Not
                        && parent_connective == Some(*connective)
                    {
                        parent_idx
                    } else {
                        tree.insert_node(NodeKind::branch(*connective), Some(parent_idx))
                    };
                    for operand in operands.iter().rev() {
                        stack.push((operand, target));
                    }
                }
            }
        }

        debug!("built tree with {} nodes", tree.len());
        Ok(tree)
    }

    fn build_leaf(&self, cond: &Condition) -> DomainResult<Leaf> {
        let field = self.resolve_field(&cond.path)?;
        let operator = resolve_operator(field.field_type, &cond.operator, &cond.value)
            .ok_or_else(|| {
                DomainError::unsupported(format!(
                    "operator \"{}\" is not supported on {} field {}",
                    cond.operator, field.field_type, field.name
                ))
            })?;
        let value = normalize_value(operator.value_mode, cond.value.clone()).ok_or_else(|| {
            DomainError::unsupported(format!(
                "operator \"{}\" takes a single value, got {}",
                operator.key, cond.value
            ))
        })?;
        Ok(Leaf {
            path: cond.path.clone(),
            field,
            operator,
            value,
        })
    }

    fn resolve_field(&self, path: &FieldPath) -> DomainResult<FieldDef> {
        match path {
            FieldPath::Constant(n @ (0 | 1)) => Ok(FieldDef::constant(*n)),
            FieldPath::Constant(n) => Err(DomainError::unsupported(format!(
                "constant leaf {n} is neither 0 nor 1"
            ))),
            FieldPath::Path(p) => self
                .field_defs
                .get(p)
                .cloned()
                .flatten()
                .ok_or_else(|| DomainError::unsupported(format!("unresolved field path: {p}"))),
        }
    }
}

/// Fit a literal to an operator's value mode.
///
/// Returns None for a list of several values under a single-valued operator.
pub fn normalize_value(mode: ValueMode, value: Value) -> Option<Value> {
    match (mode, value) {
        (ValueMode::Multiple, Value::List(items)) => Some(Value::List(items)),
        (ValueMode::Multiple, scalar) => Some(Value::List(vec![scalar])),
        (ValueMode::Single, Value::List(mut items)) if items.len() == 1 => items.pop(),
        (ValueMode::Single, Value::List(_)) => None,
        (_, value) => Some(value),
    }
}

impl DomainTree {
    /// Serialize the whole tree.
    pub fn to_domain(&self) -> Domain {
        Domain::new(self.node_expr(self.root()))
    }

    /// Serialize the subtree at `id`; None for an empty branch.
    pub fn node_expr(&self, id: NodeId) -> Option<Expr> {
        match &self.get_node(id)?.kind {
            NodeKind::Leaf(leaf) => Some(Expr::Condition(Condition {
                path: leaf.path.clone(),
                operator: leaf.operator.symbol.to_string(),
                value: leaf.value.clone(),
            })),
            NodeKind::Branch(branch) => {
                let mut operands: Vec<Expr> = branch
                    .children
                    .iter()
                    .filter_map(|&child| self.node_expr(child))
                    .collect();
                match (branch.connective, operands.len()) {
                    (_, 0) => None,
                    (Connective::Not, _) => Some(Expr::not(operands.remove(0))),
                    (_, 1) => operands.pop(),
                    (connective, _) => Some(Expr::Branch {
                        connective,
                        operands,
                    }),
                }
            }
        }
    }

    /// Serialized text of the whole tree.
    pub fn to_domain_string(&self) -> String {
        self.to_domain().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_scalar_for_multiple_then_promotes_to_list() {
        assert_eq!(
            normalize_value(ValueMode::Multiple, Value::Int(3)),
            Some(Value::List(vec![Value::Int(3)]))
        );
    }

    #[test]
    fn given_single_element_list_for_single_then_demotes() {
        assert_eq!(
            normalize_value(ValueMode::Single, Value::List(vec![Value::Int(3)])),
            Some(Value::Int(3))
        );
    }

    #[test]
    fn given_many_element_list_for_single_then_rejects() {
        assert_eq!(
            normalize_value(
                ValueMode::Single,
                Value::List(vec![Value::Int(1), Value::Int(2)])
            ),
            None
        );
    }

    #[test]
    fn given_valueless_mode_then_keeps_value() {
        assert_eq!(
            normalize_value(ValueMode::None, Value::ABSENT),
            Some(Value::ABSENT)
        );
    }
}
