use thiserror::Error;

/// Top-level error type for the `petflap-api` crate.
///
/// Covers every failure mode of the door's local API: authentication,
/// transport, device-reported errors, and malformed responses.
/// `petflap-core` maps these into consumer-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected by the door (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Device ──────────────────────────────────────────────────────
    /// Structured error reported by the door's `{"error": {...}}` envelope.
    #[error("Device error {code}: {message}")]
    Device { code: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body did not match the expected shape. Carries the raw
    /// body so the offending payload shows up in logs.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates rejected credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the device answered but the response shape was
    /// wrong -- a protocol-level failure, distinct from transport loss.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Deserialization { .. } | Self::Device { .. })
    }
}
