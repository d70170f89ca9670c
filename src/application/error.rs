//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("no model configured: pass --model or set `model` in the config")]
    ModelNotSet,

    #[error("unknown field {path} on model {model}")]
    UnknownField { model: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// True when the failure means the domain is not representable as a tree.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ApplicationError::Domain(e) if e.is_unsupported())
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
