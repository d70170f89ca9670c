//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("unsupported domain: {0}")]
    Unsupported(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Unsupported(_) => crate::exitcode::DATAERR,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Catalog { .. } => crate::exitcode::DATAERR,
                InfraError::Application(ApplicationError::Config { .. })
                | InfraError::Application(ApplicationError::ModelNotSet) => crate::exitcode::CONFIG,
                InfraError::Application(ApplicationError::OperationFailed { .. }) => {
                    crate::exitcode::NOINPUT
                }
                InfraError::Application(_) => crate::exitcode::SOFTWARE,
            },
        }
    }
}
