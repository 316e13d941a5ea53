// Door HTTP client
//
// Wraps `reqwest::Client` with door-specific URL construction, basic-auth
// credential handling, and error-envelope unwrapping. All methods return
// unwrapped payloads -- callers never see the envelope or raw HTTP types.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    ErrorEnvelope, InfoDto, PassageDto, PetDto, PetsEnvelope, PetStatusEnvelope, StatesEnvelope,
    WriteBody,
};
use crate::transport::TransportConfig;

/// HTTP client for a single PetWALK door.
///
/// Credentials are the device account's username/password, applied as
/// basic auth on every request. The door wraps failures in an
/// `{"error": {"code", "message"}}` envelope which is stripped here --
/// callers see [`Error::Device`] instead.
pub struct DoorClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: SecretString,
}

impl DoorClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the door's root address (e.g. `http://192.168.1.50:8080`).
    pub fn new(
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            http,
            base_url,
            username: username.into(),
            password,
        }
    }

    /// The door's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the device identity descriptor.
    pub async fn device_info(&self) -> Result<InfoDto, Error> {
        self.get(self.api_url("info")).await
    }

    /// Fetch the complete binary state map.
    ///
    /// The door always reports every state key it owns, so the returned
    /// map is a full snapshot, never a delta.
    pub async fn states(&self) -> Result<HashMap<String, bool>, Error> {
        let envelope: StatesEnvelope = self.get(self.api_url("states")).await?;
        Ok(envelope.states)
    }

    /// Write a single state key.
    pub async fn set_state(&self, key: &str, value: bool) -> Result<(), Error> {
        let url = self.api_url(&format!("states/{key}"));
        debug!("PUT {}", url);

        let resp = self
            .http
            .put(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(&WriteBody { value })
            .send()
            .await
            .map_err(Error::Transport)?;

        self.check_status(resp).await
    }

    /// Fetch the pet roster. `include_all` also returns pets without any
    /// recorded passage events.
    pub async fn pets(&self, include_all: bool) -> Result<Vec<PetDto>, Error> {
        let mut url = self.api_url("pets");
        url.query_pairs_mut()
            .append_pair("include_all", if include_all { "true" } else { "false" });
        let envelope: PetsEnvelope = self.get(url).await?;
        Ok(envelope.pets)
    }

    /// Fetch the latest passage event per pet for the given device.
    pub async fn pet_status(&self, device_id: u64) -> Result<HashMap<String, PassageDto>, Error> {
        let url = self.api_url(&format!("devices/{device_id}/pet-status"));
        let envelope: PetStatusEnvelope = self.get(url).await?;
        Ok(envelope.status)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL under the door's `/api/v1/` prefix.
    fn api_url(&self, path: &str) -> Url {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{base}/api/v1/{path}");
        Url::parse(&full).expect("invalid API URL")
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and parse the response body.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .send()
            .await
            .map_err(Error::Transport)?;

        self.parse_body(resp).await
    }

    /// Validate an HTTP response that carries no payload of interest.
    async fn check_status(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if let Some(err) = auth_error(status) {
            return Err(err);
        }
        if let Some(err) = envelope_error(&body) {
            return Err(err);
        }
        if !status.is_success() {
            return Err(Error::Device {
                code: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }
        Ok(())
    }

    /// Parse a response body into `T`, handling the error envelope and
    /// auth rejections first.
    async fn parse_body<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if let Some(err) = auth_error(status) {
            return Err(err);
        }
        // The door sometimes reports errors with HTTP 200.
        if let Some(err) = envelope_error(&body) {
            return Err(err);
        }
        if !status.is_success() {
            return Err(Error::Device {
                code: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// Map 401/403 statuses to authentication errors.
fn auth_error(status: reqwest::StatusCode) -> Option<Error> {
    match status {
        reqwest::StatusCode::UNAUTHORIZED => Some(Error::Authentication {
            message: "invalid credentials".into(),
        }),
        reqwest::StatusCode::FORBIDDEN => Some(Error::Authentication {
            message: "insufficient permissions (HTTP 403)".into(),
        }),
        _ => None,
    }
}

/// Extract a device error from the `{"error": {...}}` envelope, if present.
fn envelope_error(body: &str) -> Option<Error> {
    let wrapper: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let err = wrapper.error?;
    Some(Error::Device {
        code: err.code,
        message: err.message.unwrap_or_default(),
    })
}

fn preview(body: &str) -> &str {
    &body[..body.len().min(200)]
}
