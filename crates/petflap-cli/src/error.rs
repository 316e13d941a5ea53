use miette::Diagnostic;
use thiserror::Error;

use petflap_core::CoreError;

/// CLI-level error with process exit-code mapping.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl CliError {
    /// Exit codes: 3 auth, 2 connectivity/timeout, 1 everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(CoreError::AuthenticationFailed { .. }) => 3,
            Self::Core(CoreError::ConnectionFailed { .. } | CoreError::Timeout { .. }) => 2,
            Self::Core(_) => 1,
        }
    }
}
