//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent expressions the tree cannot represent and
/// contract violations of the registries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Parse or build failure of any structural kind: bad syntax, connective
    /// arity mismatch, unresolved field path, operator unknown for a field type.
    #[error("unsupported domain: {0}")]
    Unsupported(String),

    /// Operator key not present in the operator registry.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),
}

impl DomainError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported(reason.into())
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
