// Shared transport configuration for building reqwest::Client instances.
//
// The door speaks plain HTTP on the local network, so there are no TLS
// knobs here -- just timeout tuning and a stable user agent.

use std::time::Duration;

/// Transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout applied at the HTTP layer.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("petflap/0.1.0")
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
