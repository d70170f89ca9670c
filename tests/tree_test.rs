//! Tests for the tree mutation API

use std::collections::HashSet;

use domtree::domain::{
    find_operator, parse_domain, Connective, DomainTree, FieldDef, FieldDefs, FieldType, NodeId,
    NodeShape, TreeBuilder, Value,
};
use domtree::util::testing;

fn field_defs() -> FieldDefs {
    [
        FieldDef::new("a", FieldType::Integer),
        FieldDef::new("b", FieldType::Integer),
        FieldDef::new("c", FieldType::Integer),
        FieldDef::new("d", FieldType::Integer),
        FieldDef::new("age", FieldType::Integer),
        FieldDef::new("name", FieldType::Char),
        FieldDef::new("active", FieldType::Boolean),
    ]
    .into_iter()
    .map(|def| (def.name.clone(), Some(def)))
    .collect()
}

fn build_with(text: &str, collapse: bool) -> DomainTree {
    testing::init_test_setup();
    let defs = field_defs();
    TreeBuilder::new(&defs)
        .collapse_single_child(collapse)
        .build(&parse_domain(text).expect("parse"))
        .expect("build")
}

fn build(text: &str) -> DomainTree {
    build_with(text, false)
}

fn int_leaf(tree: &mut DomainTree, path: &str, value: i64) -> NodeId {
    tree.new_leaf_with(
        FieldDef::new(path, FieldType::Integer),
        find_operator("=").unwrap(),
        Value::Int(value),
    )
}

fn first_leaf(tree: &DomainTree) -> NodeId {
    tree.leaf_nodes()[0]
}

// ============================================================
// Insert / delete
// ============================================================

#[test]
fn given_and_of_two_when_inserting_after_first_then_placed_between() {
    // Arrange
    let mut tree = build(r#"[("a", "=", 1), ("b", "=", 2)]"#);
    let root = tree.root();
    let a = tree.children(root)[0];
    let c = int_leaf(&mut tree, "c", 3);

    // Act
    let inserted = tree.insert_after(root, a, c);

    // Assert
    assert!(inserted);
    assert_eq!(tree.children(root)[1], c);
    assert_eq!(
        tree.to_domain_string(),
        r#"["&", ("a", "=", 1), "&", ("c", "=", 3), ("b", "=", 2)]"#
    );
}

#[test]
fn given_inserted_node_when_deleting_it_then_structure_restored() {
    // Arrange
    let mut tree = build(r#"[("a", "=", 1), ("b", "=", 2)]"#);
    let before = tree.structure();
    let root = tree.root();
    let a = tree.children(root)[0];
    let c = int_leaf(&mut tree, "c", 3);
    tree.insert_after(root, a, c);

    // Act
    let deleted = tree.delete(root, c);

    // Assert
    assert!(deleted);
    assert_eq!(tree.structure(), before);
    assert!(!tree.contains(c));
}

#[test]
fn given_unknown_sibling_when_inserting_after_then_no_op() {
    let mut tree = build(r#"["&", ("a", "=", 1), "|", ("b", "=", 2), ("c", "=", 3)]"#);
    let root = tree.root();
    let or = tree.children(root)[1];
    let nested_b = tree.children(or)[0];
    let d = int_leaf(&mut tree, "d", 4);
    let before = tree.structure();

    assert!(!tree.insert_after(root, nested_b, d));
    assert_eq!(tree.structure(), before);
    assert_eq!(tree.parent(d), None);
}

#[test]
fn given_node_not_child_when_deleting_then_no_op() {
    let mut tree = build(r#"["&", ("a", "=", 1), "|", ("b", "=", 2), ("c", "=", 3)]"#);
    let root = tree.root();
    let or = tree.children(root)[1];
    let nested_b = tree.children(or)[0];

    assert!(!tree.delete(root, nested_b));
    assert!(tree.contains(nested_b));
}

#[test]
fn given_add_when_appending_then_last_child() {
    let mut tree = build(r#"[("a", "=", 1)]"#);
    let root = tree.root();
    let b = int_leaf(&mut tree, "b", 2);

    assert!(tree.add(root, b));

    assert_eq!(tree.children(root).last(), Some(&b));
    assert_eq!(tree.parent(b), Some(root));
}

#[test]
fn given_leaf_when_adding_to_leaf_then_refused() {
    let mut tree = build(r#"[("a", "=", 1)]"#);
    let a = first_leaf(&tree);
    let b = int_leaf(&mut tree, "b", 2);
    assert!(!tree.add(a, b));
}

#[test]
fn given_sibling_when_inserting_branch_after_then_opposite_connective_with_id_leaves() {
    // Arrange
    let mut tree = build(r#"[("a", "=", 1), ("b", "=", 2)]"#);
    let root = tree.root();
    let a = tree.children(root)[0];

    // Act
    let nested = tree.insert_branch_after(root, a).expect("inserted");

    // Assert
    assert_eq!(tree.branch(nested).map(|b| b.connective), Some(Connective::Or));
    assert_eq!(tree.children(root)[1], nested);
    assert_eq!(
        tree.to_domain_string(),
        r#"["&", ("a", "=", 1), "&", "|", ("id", "=", 1), ("id", "=", 1), ("b", "=", 2)]"#
    );
}

#[test]
fn given_not_with_operand_when_adding_second_child_then_refused() {
    // Arrange
    let mut tree = build(r#"["!", ("a", "=", 1)]"#);
    let not = tree.children(tree.root())[0];
    let a = tree.children(not)[0];
    let b = int_leaf(&mut tree, "b", 2);

    // Act
    let added = tree.add(not, b);
    let inserted = tree.insert_after(not, a, b);

    // Assert
    assert!(!added);
    assert!(!inserted);
    assert_eq!(tree.children(not), &[a]);
    assert_eq!(tree.parent(b), None);
    assert_eq!(tree.to_domain_string(), r#"["!", ("a", "=", 1)]"#);
}

#[test]
fn given_empty_not_when_adding_then_takes_one_operand() {
    let mut tree = build("[]");
    let not = tree.new_branch(Connective::Not);
    let a = int_leaf(&mut tree, "a", 1);
    let b = int_leaf(&mut tree, "b", 2);

    assert!(tree.add(not, a));
    assert!(!tree.add(not, b));
    assert!(tree.add(tree.root(), not));

    assert_eq!(tree.to_domain_string(), r#"["!", ("a", "=", 1)]"#);
}

// ============================================================
// Empty and single-child branches
// ============================================================

#[test]
fn given_nested_branch_when_deleting_all_its_children_then_branch_removed() {
    // Arrange
    let mut tree = build(r#"["&", ("a", "=", 1), "|", ("b", "=", 2), ("c", "=", 3)]"#);
    let root = tree.root();
    let or = tree.children(root)[1];
    let (b, c) = (tree.children(or)[0], tree.children(or)[1]);

    // Act
    tree.delete(or, b);
    tree.delete(or, c);

    // Assert
    assert!(!tree.contains(or));
    assert_eq!(tree.children(root).len(), 1);
    assert_eq!(tree.to_domain_string(), r#"[("a", "=", 1)]"#);
}

#[test]
fn given_empty_not_when_deleting_then_splices_up_recursively() {
    // Arrange: AND(a, OR(NOT(b)))
    let mut tree = build(r#"["&", ("a", "=", 1), "|", "!", ("b", "=", 2), ("c", "=", 3)]"#);
    let root = tree.root();
    let or = tree.children(root)[1];
    let c = tree.children(or)[1];
    tree.delete(or, c);
    let not = tree.children(or)[0];
    let b = tree.children(not)[0];

    // Act
    tree.delete(not, b);

    // Assert: NOT emptied, then OR emptied, both gone
    assert!(!tree.contains(not));
    assert!(!tree.contains(or));
    assert_eq!(tree.to_domain_string(), r#"[("a", "=", 1)]"#);
}

#[test]
fn given_keep_policy_when_branch_left_with_one_child_then_branch_persists() {
    let mut tree = build_with(
        r#"["&", ("a", "=", 1), "|", ("b", "=", 2), "&", ("c", "=", 3), ("d", "=", 4)]"#,
        false,
    );
    let root = tree.root();
    let or = tree.children(root)[1];
    let b = tree.children(or)[0];

    tree.delete(or, b);

    assert!(tree.contains(or));
    assert_eq!(tree.children(or).len(), 1);
    // a single-child OR serializes as its child
    assert_eq!(
        tree.to_domain_string(),
        r#"["&", ("a", "=", 1), "&", ("c", "=", 3), ("d", "=", 4)]"#
    );
}

#[test]
fn given_collapse_policy_when_branch_left_with_one_child_then_replaced_and_flattened() {
    // Arrange
    let mut tree = build_with(
        r#"["&", ("a", "=", 1), "|", ("b", "=", 2), "&", ("c", "=", 3), ("d", "=", 4)]"#,
        true,
    );
    let root = tree.root();
    let or = tree.children(root)[1];
    let b = tree.children(or)[0];

    // Act
    tree.delete(or, b);

    // Assert: OR gone, its AND child merged into the root AND
    assert!(!tree.contains(or));
    assert_eq!(tree.children(root).len(), 3);
    assert_eq!(tree.depth(), 2);
    let expected = build(r#"["&", ("a", "=", 1), "&", ("c", "=", 3), ("d", "=", 4)]"#);
    assert_eq!(tree.structure(), expected.structure());
}

#[test]
fn given_collapse_policy_when_leaf_remains_then_leaf_moves_up() {
    let mut tree = build_with(
        r#"["&", ("a", "=", 1), "|", ("b", "=", 2), ("c", "=", 3)]"#,
        true,
    );
    let root = tree.root();
    let or = tree.children(root)[1];
    let (b, c) = (tree.children(or)[0], tree.children(or)[1]);

    tree.delete(or, b);

    assert_eq!(tree.children(root), &[tree.children(root)[0], c]);
    assert_eq!(tree.parent(c), Some(root));
}

#[test]
fn given_last_root_child_when_deleting_then_empty_domain() {
    let mut tree = build(r#"[("a", "=", 1)]"#);
    let root = tree.root();
    let a = first_leaf(&tree);

    tree.delete(root, a);

    assert!(tree.is_empty());
    assert!(tree.contains(root));
    assert_eq!(tree.to_domain_string(), "[]");
}

// ============================================================
// Identity and clone
// ============================================================

#[test]
fn given_branch_when_cloning_then_fresh_ids_and_equal_shape() {
    // Arrange
    let mut tree = build(r#"["&", ("a", "=", 1), "|", ("b", "=", 2), ("c", "=", 3)]"#);
    let or = tree.children(tree.root())[1];

    // Act
    let copy = tree.clone_node(or).expect("clone");

    // Assert
    let original_ids: HashSet<NodeId> = tree.iter_from(or).map(|(id, _)| id).collect();
    let copy_ids: HashSet<NodeId> = tree.iter_from(copy).map(|(id, _)| id).collect();
    assert!(original_ids.is_disjoint(&copy_ids));
    assert_eq!(copy_ids.len(), 3);
    assert_eq!(tree.shape(copy), tree.shape(or));
    assert_eq!(tree.parent(copy), None);
}

#[test]
fn given_deleted_node_when_creating_new_then_id_not_reused() {
    let mut tree = build(r#"[("a", "=", 1), ("b", "=", 2)]"#);
    let root = tree.root();
    let b = tree.children(root)[1];
    tree.delete(root, b);

    let fresh = int_leaf(&mut tree, "b", 2);

    assert_ne!(fresh, b);
}

#[test]
fn given_detached_clone_when_discarded_then_gone() {
    let mut tree = build(r#"[("a", "=", 1)]"#);
    let a = first_leaf(&tree);
    let copy = tree.clone_node(a).unwrap();

    tree.discard(copy);

    assert!(!tree.contains(copy));
    assert!(tree.contains(a));
}

// ============================================================
// Leaf edits
// ============================================================

#[test]
fn given_equal_leaf_when_switching_to_in_then_value_wrapped() {
    let mut tree = build(r#"[("age", "=", 10)]"#);
    let leaf = first_leaf(&tree);

    tree.update_leaf_operator(leaf, find_operator("in").unwrap());

    assert_eq!(
        tree.leaf(leaf).unwrap().value,
        Value::List(vec![Value::Int(10)])
    );
}

#[test]
fn given_in_leaf_when_switching_to_equal_then_first_element() {
    let mut tree = build(r#"[("age", "in", [10, 20])]"#);
    let leaf = first_leaf(&tree);

    tree.update_leaf_operator(leaf, find_operator("=").unwrap());

    assert_eq!(tree.leaf(leaf).unwrap().value, Value::Int(10));
    assert_eq!(tree.to_domain_string(), r#"[("age", "=", 10)]"#);
}

#[test]
fn given_boolean_leaf_when_switching_to_set_then_false_sentinel() {
    let mut tree = build(r#"[("active", "=", True)]"#);
    let leaf = first_leaf(&tree);

    tree.update_leaf_operator(leaf, find_operator("set").unwrap());

    assert_eq!(tree.leaf(leaf).unwrap().value, Value::Bool(false));
    assert_eq!(tree.to_domain_string(), r#"[("active", "!=", False)]"#);
}

#[test]
fn given_leaf_when_changing_field_then_defaults_of_new_type() {
    let mut tree = build(r#"[("age", ">", 10)]"#);
    let leaf = first_leaf(&tree);

    tree.update_field(leaf, FieldDef::new("name", FieldType::Char));

    let leaf = tree.leaf(leaf).unwrap();
    assert_eq!(leaf.operator.key, "=");
    assert_eq!(leaf.value, Value::from(""));
    assert_eq!(tree.to_domain_string(), r#"[("name", "=", "")]"#);
}

#[test]
fn given_leaf_when_updating_value_then_overwritten() {
    let mut tree = build(r#"[("age", "=", 10)]"#);
    let leaf = first_leaf(&tree);

    assert!(tree.update_leaf_value(leaf, Value::Int(42)));

    assert_eq!(tree.to_domain_string(), r#"[("age", "=", 42)]"#);
}

#[test]
fn given_branch_when_updating_value_then_no_op() {
    let mut tree = build(r#"[("age", "=", 10)]"#);
    let root = tree.root();
    assert!(!tree.update_leaf_value(root, Value::Int(1)));
}

// ============================================================
// Connectives
// ============================================================

#[test]
fn given_single_child_branch_when_setting_not_then_negates() {
    let mut tree = build(r#"[("a", "=", 1)]"#);
    let root = tree.root();
    let a = first_leaf(&tree);
    let wrapper = tree.new_branch(Connective::And);
    let copy = tree.clone_node(a).unwrap();
    tree.add(wrapper, copy);
    tree.add(root, wrapper);

    assert!(tree.set_connective(wrapper, Connective::Not));

    assert_eq!(
        tree.to_domain_string(),
        r#"["&", ("a", "=", 1), "!", ("a", "=", 1)]"#
    );
}

#[test]
fn given_two_child_branch_when_setting_not_then_refused() {
    let mut tree = build(r#"["&", ("a", "=", 1), "|", ("b", "=", 2), ("c", "=", 3)]"#);
    let or = tree.children(tree.root())[1];
    assert!(!tree.set_connective(or, Connective::Not));
    assert!(tree.set_connective(or, Connective::And));
    assert!(matches!(
        tree.shape(or),
        Some(NodeShape::Branch {
            connective: Connective::And,
            ..
        })
    ));
}
