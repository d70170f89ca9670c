//! Field metadata as resolved by the metadata collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Value type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Boolean,
    Char,
    Text,
    Html,
    Integer,
    Float,
    Monetary,
    Date,
    Datetime,
    Selection,
    Many2one,
    One2many,
    Many2many,
    Id,
}

impl FieldType {
    pub const ALL: &'static [FieldType] = &[
        FieldType::Boolean,
        FieldType::Char,
        FieldType::Text,
        FieldType::Html,
        FieldType::Integer,
        FieldType::Float,
        FieldType::Monetary,
        FieldType::Date,
        FieldType::Datetime,
        FieldType::Selection,
        FieldType::Many2one,
        FieldType::One2many,
        FieldType::Many2many,
        FieldType::Id,
    ];

    /// Relational types can be traversed by dotted paths.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            FieldType::Many2one | FieldType::One2many | FieldType::Many2many
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Char => "char",
            FieldType::Text => "text",
            FieldType::Html => "html",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Monetary => "monetary",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Selection => "selection",
            FieldType::Many2one => "many2one",
            FieldType::One2many => "one2many",
            FieldType::Many2many => "many2many",
            FieldType::Id => "id",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolved definition of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Full (possibly dotted) path from the root model
    pub name: String,
    pub field_type: FieldType,
    /// Human readable label
    pub label: String,
    /// Target model of relational fields
    pub relation: Option<String>,
    /// `(key, label)` options of selection fields
    pub selection: Vec<(String, String)>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            field_type,
            relation: None,
            selection: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn with_selection(mut self, options: &[(&str, &str)]) -> Self {
        self.selection = options
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    /// Pseudo-field of the `(1, "=", 1)` / `(0, "=", 1)` shorthand leaves.
    pub fn constant(n: i64) -> Self {
        Self::new(n.to_string(), FieldType::Integer)
    }

    /// The record id field, used by default leaves.
    pub fn id() -> Self {
        Self::new("id", FieldType::Id).with_label("ID")
    }
}
