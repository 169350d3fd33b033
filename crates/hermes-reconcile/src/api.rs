use hermes_model::EntityKind;
use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Wire values
// ---------------------------------------------------------------------------

/// A raw response from a management endpoint.
///
/// Non-2xx statuses are NOT errors at this level: 404 and 500 on reads are
/// regular inputs to the decision table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text for logs and reports (lossy on invalid UTF-8).
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Request body for a mutating call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub body: Vec<u8>,
    pub content_type: String,
}

impl Payload {
    pub const JSON: &'static str = "application/json";

    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        let body = serde_json::to_vec(value).map_err(|e| ApiError::Codec(e.to_string()))?;
        Ok(Self {
            body,
            content_type: Self::JSON.to_string(),
        })
    }

    pub fn raw(body: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            body,
            content_type: content_type.unwrap_or_else(|| Self::JSON.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`ManagementApi`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection refused, timeout, TLS failure.
    Transport(String),
    /// A listing call answered with a non-success status.
    Status { status: u16, body: String },
    /// A body could not be encoded or decoded.
    Codec(String),
    /// The client could not be constructed from its configuration.
    Config(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "transport error: {msg}"),
            ApiError::Status { status, body } => write!(f, "http status {status}: {body}"),
            ApiError::Codec(msg) => write!(f, "codec error: {msg}"),
            ApiError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

// ---------------------------------------------------------------------------
// Endpoint trait
// ---------------------------------------------------------------------------

/// One management endpoint (source or destination).
///
/// Calls are blocking; the engine issues exactly one at a time.
pub trait ManagementApi {
    /// Human-readable label for logs (usually the base URL).
    fn endpoint(&self) -> &str;

    /// Ordered names of a collection. Only `Group` and `Topic` are listable.
    fn list(&self, kind: EntityKind) -> Result<Vec<String>, ApiError>;

    /// Read one entity. `Schema` reads address the owning topic's name.
    fn read(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError>;

    fn create(
        &self,
        kind: EntityKind,
        name: &str,
        payload: &Payload,
    ) -> Result<ApiResponse, ApiError>;

    /// Full replace, not a partial merge.
    fn replace(
        &self,
        kind: EntityKind,
        name: &str,
        payload: &Payload,
    ) -> Result<ApiResponse, ApiError>;

    fn delete(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError>;
}

impl<T: ManagementApi + ?Sized> ManagementApi for &T {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn list(&self, kind: EntityKind) -> Result<Vec<String>, ApiError> {
        (**self).list(kind)
    }

    fn read(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError> {
        (**self).read(kind, name)
    }

    fn create(
        &self,
        kind: EntityKind,
        name: &str,
        payload: &Payload,
    ) -> Result<ApiResponse, ApiError> {
        (**self).create(kind, name, payload)
    }

    fn replace(
        &self,
        kind: EntityKind,
        name: &str,
        payload: &Payload,
    ) -> Result<ApiResponse, ApiError> {
        (**self).replace(kind, name, payload)
    }

    fn delete(&self, kind: EntityKind, name: &str) -> Result<ApiResponse, ApiError> {
        (**self).delete(kind, name)
    }
}
