//! Parse, build and serialize: canonical output is a fixed point

use rstest::rstest;

use domtree::domain::{parse_domain, DomainTree, FieldDef, FieldDefs, FieldType, TreeBuilder};

fn field_defs() -> FieldDefs {
    [
        FieldDef::new("name", FieldType::Char),
        FieldDef::new("active", FieldType::Boolean),
        FieldDef::new("age", FieldType::Integer),
        FieldDef::new("credit_limit", FieldType::Monetary),
        FieldDef::new("birthday", FieldType::Date),
        FieldDef::new("state", FieldType::Selection).with_selection(&[("draft", "Draft")]),
        FieldDef::new("category_id", FieldType::Many2many).with_relation("res.partner.category"),
        FieldDef::new("id", FieldType::Id),
    ]
    .into_iter()
    .map(|def| (def.name.clone(), Some(def)))
    .collect()
}

fn build(text: &str) -> DomainTree {
    let defs = field_defs();
    TreeBuilder::new(&defs)
        .build(&parse_domain(text).expect("parse"))
        .expect("build")
}

#[rstest]
#[case::empty("[]")]
#[case::single_leaf(r#"[("name", "=", "acme")]"#)]
#[case::implicit_and(r#"[('name', 'ilike', 'a'), ('age', '>', 18), ('active', '=', True)]"#)]
#[case::explicit_or(r#"["|", ("age", "<", 18), ("age", ">", 65)]"#)]
#[case::negation(r#"["!", ("state", "in", ["draft"])]"#)]
#[case::nested(r#"["|", "&", ("name", "=", "a"), ("age", "=", 1), "!", "|", ("active", "=", False), ("birthday", "!=", False)]"#)]
#[case::floats_and_none(r#"[("credit_limit", ">=", 1.5), ("name", "!=", None)]"#)]
#[case::constants(r#"["|", (1, "=", 1), (0, "=", 1)]"#)]
#[case::relational_list(r#"[("category_id", "not in", (3, 4))]"#)]
#[case::escaped_string(r#"[("name", "=", "say \"hi\"\n")]"#)]
fn given_supported_domain_when_round_tripping_then_structure_and_text_stable(#[case] text: &str) {
    // Arrange
    let first = build(text);
    let canonical = first.to_domain_string();

    // Act
    let second = build(&canonical);

    // Assert
    assert_eq!(second.structure(), first.structure());
    assert_eq!(second.to_domain_string(), canonical);
}

#[rstest]
#[case(r#"[("age", "=", 1), ("age", "=", 2)]"#, r#"["&", ("age", "=", 1), ("age", "=", 2)]"#)]
#[case(r#"['&', ('id', 'in', [1]), ('active', '!=', False)]"#, r#"["&", ("id", "in", [1]), ("active", "!=", False)]"#)]
#[case(r#"[("age", "in", 7)]"#, r#"[("age", "in", [7])]"#)]
fn given_loose_input_when_serializing_then_canonical(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(build(text).to_domain_string(), expected);
}
