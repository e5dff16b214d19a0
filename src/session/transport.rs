//! Transport abstraction shared by the session and request layers.
//!
//! Implementations must keep cookies between calls so the server-side session
//! survives across requests, and must never follow redirects: the setup and
//! login flows decide success by inspecting the raw 30x response.

use async_trait::async_trait;
use http::Method;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, LOCATION};
use thiserror::Error;
use url::Url;

/// File part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFile {
    pub field: String,
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Multipart form payload (text fields followed by file parts).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<MultipartFile>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        self.files.push(MultipartFile {
            field: field.into(),
            file_name: file_name.into(),
            content,
        });
        self
    }
}

/// Request payload variants understood by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Form(Vec<(String, String)>),
    Json(Vec<u8>),
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Value of a form or multipart text field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        let fields = match self {
            RequestBody::Form(fields) => fields,
            RequestBody::Multipart(form) => &form.fields,
            _ => return None,
        };
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A single outgoing request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl TransportRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Set a header. Names are case-insensitive; invalid names or values are
    /// rejected as [`TransportError::InvalidRequest`].
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, TransportError> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidRequest(format!("invalid header name '{name}'")))?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            TransportError::InvalidRequest(format!("invalid value for header '{name}'"))
        })?;
        self.headers.insert(header, value);
        Ok(self)
    }
}

/// Minimal response representation returned by the transport abstraction.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub is_redirect: bool,
}

impl TransportResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_ascii_lowercase().contains("json"))
            .unwrap_or(false)
    }

    /// `true` when the response redirects to a location ending in `suffix`.
    ///
    /// Query strings are ignored (`/setup?next=…` still counts as `/setup`).
    pub fn redirects_to(&self, suffix: &str) -> bool {
        self.is_redirect
            && self
                .location()
                .map(|location| {
                    let path = location.split(['?', '#']).next().unwrap_or(location);
                    path.trim_end_matches('/').ends_with(suffix)
                })
                .unwrap_or(false)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http transport error: {0}")]
    Transport(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Contract that abstracts the underlying HTTP transport.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}
