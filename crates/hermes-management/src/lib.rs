//! hermes-management
//!
//! Blocking HTTP implementation of [`ManagementApi`] for the management
//! service control-plane API:
//!
//! | kind | read | create | replace | delete |
//! |---|---|---|---|---|
//! | group | `GET /groups/{n}` | `POST /groups` | `PUT /groups/{n}` | `DELETE /groups/{n}` |
//! | topic | `GET /topics/{n}` | `POST /topics` | `PUT /topics/{n}` | `DELETE /topics/{n}` |
//! | schema | `GET /topics/{n}/schema` | `POST /topics/{n}/schema` | - | - |
//!
//! The configured auth header is attached to mutating calls only.
//! Its value is never logged.

use std::time::Duration;

use hermes_model::EntityKind;
use hermes_reconcile::{ApiError, ApiResponse, ManagementApi, Payload};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Authorization header sent on every mutating call.
///
/// **Value is redacted in `Debug` output.**
#[derive(Clone)]
pub struct AuthHeader {
    pub name: String,
    pub value: String,
}

impl AuthHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHeader")
            .field("name", &self.name)
            .field("value", &"<REDACTED>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    /// Per-call timeout covering connect and body transfer.
    pub timeout: Duration,
    pub auth: Option<AuthHeader>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            auth: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auth(mut self, auth: AuthHeader) -> Self {
        self.auth = Some(auth);
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ManagementClient {
    base_url: String,
    http: Client,
    auth: Option<(HeaderName, HeaderValue)>,
}

impl ManagementClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("http client build failed: {e}")))?;

        let auth = match config.auth {
            Some(a) => {
                let name = HeaderName::from_bytes(a.name.as_bytes())
                    .map_err(|_| ApiError::Config(format!("invalid auth header name '{}'", a.name)))?;
                let mut value = HeaderValue::from_str(&a.value)
                    .map_err(|_| ApiError::Config("invalid auth header value".to_string()))?;
                value.set_sensitive(true);
                Some((name, value))
            }
            None => None,
        };

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            auth,
        })
    }

    fn collection_url(&self, kind: EntityKind) -> Result<String, ApiError> {
        match kind {
            EntityKind::Group => Ok(format!("{}/groups", self.base_url)),
            EntityKind::Topic => Ok(format!("{}/topics", self.base_url)),
            EntityKind::Schema => Err(ApiError::Config(
                "schemas have no collection endpoint".to_string(),
            )),
        }
    }

    fn entity_url(&self, kind: EntityKind, name: &str) -> String {
        match kind {
            EntityKind::Group => format!("{}/groups/{}", self.base_url, name),
            EntityKind::Topic => format!("{}/topics/{}", self.base_url, name),
            EntityKind::Schema => format!("{}/topics/{}/schema", self.base_url, name),
        }
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some((name, value)) => req.header(name.clone(), value.clone()),
            None => req,
        }
    }

    fn send(&self, req: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let resp = req
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .map_err(|e| ApiError::Transport(format!("body read failed: {e}")))?
            .to_vec();
        Ok(ApiResponse {
            status,
            body,
            content_type,
        })
    }

    fn with_payload(req: RequestBuilder, payload: &Payload) -> RequestBuilder {
        req.header(CONTENT_TYPE, payload.content_type.as_str())
            .body(payload.body.clone())
    }
}

impl ManagementApi for ManagementClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<String>, ApiError> {
        let url = self.collection_url(kind)?;
        debug!(url = url.as_str(), "listing");
        let resp = self.send(self.http.get(&url))?;
        if resp.status != 200 {
            return Err(ApiError::Status {
                status: resp.status,
                body: resp.body_text(),
            });
        }
        serde_json::from_slice(&resp.body)
            .map_err(|e| ApiError::Codec(format!("{kind} listing decode failed: {e}")))
    }

    fn read(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError> {
        self.send(self.http.get(self.entity_url(kind, name)))
    }

    fn create(
        &self,
        kind: EntityKind,
        name: &str,
        payload: &Payload,
    ) -> Result<ApiResponse, ApiError> {
        let url = match kind {
            EntityKind::Schema => self.entity_url(kind, name),
            _ => self.collection_url(kind)?,
        };
        let req = Self::with_payload(self.authorized(self.http.post(url)), payload);
        self.send(req)
    }

    fn replace(
        &self,
        kind: EntityKind,
        name: &str,
        payload: &Payload,
    ) -> Result<ApiResponse, ApiError> {
        if kind == EntityKind::Schema {
            return Err(ApiError::Config("schemas are never replaced".to_string()));
        }
        let req = Self::with_payload(
            self.authorized(self.http.put(self.entity_url(kind, name))),
            payload,
        );
        self.send(req)
    }

    fn delete(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError> {
        if kind == EntityKind::Schema {
            return Err(ApiError::Config("schemas are never deleted".to_string()));
        }
        self.send(self.authorized(self.http.delete(self.entity_url(kind, name))))
    }
}
