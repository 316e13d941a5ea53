// ── Core error types ──
//
// Consumer-facing errors from petflap-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<petflap_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the door: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    /// The door answered, but the response did not have the expected
    /// shape. Distinct from transport loss for diagnostics.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// The door understood the request and refused it.
    #[error("Device rejected the request: {message}")]
    Rejected { message: String },

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Coordinator is not running")]
    NotRunning,

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<petflap_api::Error> for CoreError {
    fn from(err: petflap_api::Error) -> Self {
        match err {
            petflap_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            petflap_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                }
            }
            petflap_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            petflap_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            petflap_api::Error::Device { code, message } => CoreError::Rejected {
                message: format!("{message} (code {code})"),
            },
            petflap_api::Error::Deserialization { message, body: _ } => {
                CoreError::Protocol { message }
            }
        }
    }
}
