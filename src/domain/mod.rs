//! Domain layer: filter domains, their editable trees and the static registries
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod ast;
pub mod builder;
pub mod editors;
pub mod error;
pub mod field;
pub mod mutation;
pub mod operators;
pub mod parser;
pub mod tree_traits;
pub mod value;

pub use arena::{Branch, DomainTree, Leaf, NodeId, NodeKind, NodeShape, TreeNode};
pub use ast::{Condition, Connective, Domain, Expr, FieldPath, Token};
pub use builder::{normalize_value, FieldDefs, TreeBuilder};
pub use editors::{default_field_value, default_value, editor_info, EditorKind};
pub use error::{DomainError, DomainResult};
pub use field::{FieldDef, FieldType};
pub use mutation::migrate_value;
pub use operators::{
    default_operator, find_operator, offered_operators, operators_info, Operator, ValueMode,
    OPERATORS,
};
pub use parser::{parse_domain, parse_domain_with, ParseOptions};
pub use tree_traits::TreeNodeConvert;
pub use value::Value;
