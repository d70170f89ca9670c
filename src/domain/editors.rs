//! Field-type editor registry.
//!
//! Maps a field type and operator to the kind of value editor the UI shows,
//! and provides default values for new or migrated leaves.

use std::fmt;

use chrono::Local;

use crate::domain::error::DomainResult;
use crate::domain::field::{FieldDef, FieldType};
use crate::domain::operators::{find_operator, Operator, ValueMode};
use crate::domain::value::Value;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kind of value editor for a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorKind {
    /// The operator takes no value
    None,
    Boolean,
    Text,
    Integer,
    Float,
    Date,
    Datetime,
    Selection,
    /// Record picker on the field's relation
    Record,
    /// Editor for a list of values, one inner editor per element
    List(Box<EditorKind>),
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorKind::None => write!(f, "none"),
            EditorKind::Boolean => write!(f, "boolean"),
            EditorKind::Text => write!(f, "text"),
            EditorKind::Integer => write!(f, "integer"),
            EditorKind::Float => write!(f, "float"),
            EditorKind::Date => write!(f, "date"),
            EditorKind::Datetime => write!(f, "datetime"),
            EditorKind::Selection => write!(f, "selection"),
            EditorKind::Record => write!(f, "record"),
            EditorKind::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}

fn base_editor(field_type: FieldType) -> EditorKind {
    match field_type {
        FieldType::Boolean => EditorKind::Boolean,
        FieldType::Char | FieldType::Text | FieldType::Html => EditorKind::Text,
        FieldType::Integer | FieldType::Id => EditorKind::Integer,
        FieldType::Float | FieldType::Monetary => EditorKind::Float,
        FieldType::Date => EditorKind::Date,
        FieldType::Datetime => EditorKind::Datetime,
        FieldType::Selection => EditorKind::Selection,
        FieldType::Many2one | FieldType::One2many | FieldType::Many2many => EditorKind::Record,
    }
}

/// Pattern operators compare against text whatever the field type.
fn is_pattern_operator(operator: &Operator) -> bool {
    matches!(
        operator.key,
        "like" | "not like" | "ilike" | "not ilike" | "=like" | "=ilike"
    )
}

/// Editor for a field type and an already resolved operator.
pub fn editor_for(field_type: FieldType, operator: &Operator) -> EditorKind {
    if operator.value_mode == ValueMode::None {
        return EditorKind::None;
    }
    let inner = if is_pattern_operator(operator) {
        EditorKind::Text
    } else {
        base_editor(field_type)
    };
    match operator.value_mode {
        ValueMode::Multiple => EditorKind::List(Box::new(inner)),
        _ => inner,
    }
}

/// Editor for a field type and operator key.
pub fn editor_info(field_type: FieldType, operator_key: &str) -> DomainResult<EditorKind> {
    let operator = find_operator(operator_key)?;
    Ok(editor_for(field_type, operator))
}

/// Default scalar value for a field.
pub fn default_field_value(field: &FieldDef) -> Value {
    match field.field_type {
        FieldType::Boolean => Value::Bool(true),
        FieldType::Char | FieldType::Text | FieldType::Html => Value::Str(String::new()),
        FieldType::Integer | FieldType::Id => Value::Int(1),
        FieldType::Float | FieldType::Monetary => Value::Float(1.0),
        FieldType::Date => Value::Str(Local::now().format(DATE_FORMAT).to_string()),
        FieldType::Datetime => Value::Str(Local::now().format(DATETIME_FORMAT).to_string()),
        FieldType::Selection => field
            .selection
            .first()
            .map(|(key, _)| Value::Str(key.clone()))
            .unwrap_or(Value::ABSENT),
        FieldType::Many2one | FieldType::One2many | FieldType::Many2many => Value::Int(1),
    }
}

/// Default value shaped for an operator's value mode.
pub fn default_value(field: &FieldDef, operator: &Operator) -> Value {
    match operator.value_mode {
        ValueMode::None => Value::ABSENT,
        ValueMode::Single => default_field_value(field),
        ValueMode::Multiple => Value::List(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_valueless_operator_then_no_editor() {
        assert_eq!(editor_info(FieldType::Char, "set").unwrap(), EditorKind::None);
    }

    #[test]
    fn given_pattern_operator_on_relation_then_text_editor() {
        assert_eq!(
            editor_info(FieldType::Many2one, "ilike").unwrap(),
            EditorKind::Text
        );
    }

    #[test]
    fn given_multiple_operator_then_list_of_base_editor() {
        assert_eq!(
            editor_info(FieldType::Integer, "in").unwrap(),
            EditorKind::List(Box::new(EditorKind::Integer))
        );
        assert_eq!(
            editor_info(FieldType::Many2many, "not in").unwrap().to_string(),
            "list<record>"
        );
    }

    #[test]
    fn given_unknown_operator_key_then_error() {
        assert!(editor_info(FieldType::Char, "nope").is_err());
    }

    #[test]
    fn given_selection_field_then_default_is_first_option() {
        let field = FieldDef::new("state", FieldType::Selection)
            .with_selection(&[("draft", "Draft"), ("done", "Done")]);
        assert_eq!(default_field_value(&field), Value::from("draft"));
    }

    #[test]
    fn given_date_field_then_default_is_formatted_today() {
        let field = FieldDef::new("date", FieldType::Date);
        let Value::Str(today) = default_field_value(&field) else {
            panic!("date default should be a string");
        };
        assert!(chrono::NaiveDate::parse_from_str(&today, DATE_FORMAT).is_ok());
    }

    #[test]
    fn given_operator_modes_then_default_value_is_shaped() {
        let field = FieldDef::new("age", FieldType::Integer);
        assert_eq!(default_value(&field, find_operator("=").unwrap()), Value::Int(1));
        assert_eq!(
            default_value(&field, find_operator("in").unwrap()),
            Value::List(vec![])
        );
        assert_eq!(
            default_value(&field, find_operator("set").unwrap()),
            Value::ABSENT
        );
    }
}
