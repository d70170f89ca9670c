//! Operator registry.
//!
//! Single source of truth for the comparison operators a leaf can use.
//! An operator's `key` identifies it in the editor vocabulary; its `symbol`
//! is what the serialized domain carries. They differ only for the
//! value-less `set` / `not set` operators, which are written as
//! `!= False` / `= False`.

use std::fmt;

use itertools::Itertools;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::field::FieldType;
use crate::domain::value::Value;

/// How many values a leaf with this operator carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueMode {
    /// No meaningful value; the leaf stores the `False` sentinel
    None,
    Single,
    Multiple,
}

impl fmt::Display for ValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueMode::None => "none",
            ValueMode::Single => "single",
            ValueMode::Multiple => "multiple",
        };
        write!(f, "{label}")
    }
}

/// Operator descriptor.
#[derive(Debug)]
pub struct Operator {
    pub key: &'static str,
    pub label: &'static str,
    pub symbol: &'static str,
    pub value_mode: ValueMode,
}

impl Operator {
    const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            symbol: key,
            value_mode: ValueMode::Single,
        }
    }

    const fn multiple(mut self) -> Self {
        self.value_mode = ValueMode::Multiple;
        self
    }

    /// Value-less operator written as `symbol False`.
    const fn valueless(mut self, symbol: &'static str) -> Self {
        self.symbol = symbol;
        self.value_mode = ValueMode::None;
        self
    }

    /// Whether a serialized `(symbol, value)` pair denotes this operator.
    pub fn matches(&self, symbol: &str, value: &Value) -> bool {
        match self.value_mode {
            ValueMode::None => self.symbol == symbol && value.is_false(),
            ValueMode::Single | ValueMode::Multiple => self.symbol == symbol,
        }
    }
}

/// Operators compare by key.
impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Operator {}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Registry of all operators.
pub const OPERATORS: &[Operator] = &[
    Operator::new("=", "is equal to"),
    Operator::new("!=", "is not equal to"),
    Operator::new(">", "greater than"),
    Operator::new(">=", "greater than or equal to"),
    Operator::new("<", "lower than"),
    Operator::new("<=", "lower than or equal to"),
    Operator::new("=like", "matches"),
    Operator::new("=ilike", "matches (case insensitive)"),
    Operator::new("like", "contains (case sensitive)"),
    Operator::new("not like", "does not contain (case sensitive)"),
    Operator::new("ilike", "contains"),
    Operator::new("not ilike", "does not contain"),
    Operator::new("in", "is in").multiple(),
    Operator::new("not in", "is not in").multiple(),
    Operator::new("child_of", "child of"),
    Operator::new("parent_of", "parent of"),
    Operator::new("set", "is set").valueless("!="),
    Operator::new("not set", "is not set").valueless("="),
];

const BOOLEAN_OPERATORS: &[&str] = &["=", "!="];
const TEXT_OPERATORS: &[&str] = &["=", "!=", "ilike", "not ilike", "in", "not in", "set", "not set"];
const NUMBER_OPERATORS: &[&str] = &[
    "=", "!=", ">", ">=", "<", "<=", "in", "not in", "set", "not set",
];
const ID_OPERATORS: &[&str] = &["=", "!=", ">", ">=", "<", "<=", "in", "not in"];
const DATE_OPERATORS: &[&str] = &["=", "!=", ">", ">=", "<", "<=", "set", "not set"];
const SELECTION_OPERATORS: &[&str] = &["=", "!=", "in", "not in", "set", "not set"];
const MANY2ONE_OPERATORS: &[&str] = &[
    "=", "!=", "ilike", "not ilike", "in", "not in", "child_of", "set", "not set",
];
const X2MANY_OPERATORS: &[&str] = &["in", "not in", "ilike", "not ilike", "set", "not set"];

fn operator_keys(field_type: FieldType) -> &'static [&'static str] {
    match field_type {
        FieldType::Boolean => BOOLEAN_OPERATORS,
        FieldType::Char | FieldType::Text | FieldType::Html => TEXT_OPERATORS,
        FieldType::Integer | FieldType::Float | FieldType::Monetary => NUMBER_OPERATORS,
        FieldType::Id => ID_OPERATORS,
        FieldType::Date | FieldType::Datetime => DATE_OPERATORS,
        FieldType::Selection => SELECTION_OPERATORS,
        FieldType::Many2one => MANY2ONE_OPERATORS,
        FieldType::One2many | FieldType::Many2many => X2MANY_OPERATORS,
    }
}

/// Look up an operator by key.
pub fn find_operator(key: &str) -> DomainResult<&'static Operator> {
    OPERATORS
        .iter()
        .find(|op| op.key == key)
        .ok_or_else(|| DomainError::UnknownOperator(key.to_string()))
}

/// Operators offered for a field type, in display order.
pub fn operators_info(field_type: FieldType) -> Vec<&'static Operator> {
    operator_keys(field_type)
        .iter()
        .filter_map(|key| OPERATORS.iter().find(|op| op.key == *key))
        .collect()
}

/// Operator a new leaf on this field type starts with.
pub fn default_operator(field_type: FieldType) -> &'static Operator {
    operators_info(field_type)
        .into_iter()
        .next()
        .unwrap_or(&OPERATORS[0])
}

/// Operators offered for a leaf, with its current operator appended when the
/// field type does not register it (e.g. a hand-written domain).
pub fn offered_operators(field_type: FieldType, current: &'static Operator) -> Vec<&'static Operator> {
    let mut offered = operators_info(field_type);
    if !offered.contains(&current) {
        offered.push(current);
    }
    offered
}

/// Resolve the operator of a serialized leaf.
///
/// The field type's operators are tried first, then the whole registry.
/// Within each group value-less operators are tried first, so `!= False`
/// reads as "is set" wherever the field type offers it.
pub fn resolve_operator(field_type: FieldType, symbol: &str, value: &Value) -> Option<&'static Operator> {
    let by_specificity = |ops: Vec<&'static Operator>| {
        ops.into_iter()
            .sorted_by_key(|op| op.value_mode != ValueMode::None)
            .find(|op| op.matches(symbol, value))
    };
    by_specificity(operators_info(field_type)).or_else(|| by_specificity(OPERATORS.iter().collect()))
}
