//! Error types for the ecce CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.
//! Engine-level failures (`InvocationError`, `SpliceError`) live next to the code
//! that produces them and convert into `EcceError` when they become fatal.

use crate::agent::InvocationError;
use crate::exit_codes;
use crate::splice::SpliceError;
use thiserror::Error;

/// Main error type for ecce operations.
#[derive(Error, Debug)]
pub enum EcceError {
    /// User provided invalid arguments or input.
    #[error("{0}")]
    UserError(String),

    /// The watch target could not be resolved to a readable file.
    #[error("watch target not found: {0}")]
    FileNotFound(String),

    /// An agent or task name did not resolve to a configured entry.
    #[error("{0}")]
    ConfigMissing(String),

    /// The configuration file or a configured value is invalid.
    #[error("invalid configuration: {0}")]
    ConfigError(String),

    /// The external agent failed.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// Writing generated text back into the watched file failed.
    #[error(transparent)]
    Splice(#[from] SpliceError),
}

impl EcceError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            EcceError::UserError(_) => exit_codes::USER_ERROR,
            EcceError::FileNotFound(_) => exit_codes::FILE_NOT_FOUND,
            EcceError::ConfigMissing(_) => exit_codes::CONFIG_FAILURE,
            EcceError::ConfigError(_) => exit_codes::CONFIG_FAILURE,
            EcceError::Invocation(_) => exit_codes::INVOCATION_FAILURE,
            EcceError::Splice(_) => exit_codes::SPLICE_FAILURE,
        }
    }
}

/// Result type alias for ecce operations.
pub type Result<T> = std::result::Result<T, EcceError>;
