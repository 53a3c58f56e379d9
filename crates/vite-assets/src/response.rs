use bytes::Bytes;
use http::{
    header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE},
    HeaderMap, StatusCode,
};

use crate::error::AssetError;

const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Response produced by the asset handlers.
#[derive(Debug, Clone)]
pub struct AssetResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl AssetResponse {
    /// Create a new response with the provided status code and empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create a plain text response.
    pub fn text(body: impl Into<String>) -> Self {
        let mut response = Self::new(StatusCode::OK);
        response.set_header(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response.body = Bytes::from(body.into());
        response
    }

    /// The standard not-found page. Never mentions what was looked up.
    pub fn not_found() -> Self {
        Self::text(NOT_FOUND_BODY).with_status(StatusCode::NOT_FOUND)
    }

    /// Respond with `body` under a fixed content type.
    pub fn bytes(body: impl Into<Bytes>, content_type: &'static str) -> Self {
        let mut response = Self::ok();
        response.set_header(CONTENT_TYPE, HeaderValue::from_static(content_type));
        response.with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Insert or replace a header value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        let mut response = self;
        response.ensure_content_length();
        (response.status, response.headers, response.body)
    }

    fn ensure_content_length(&mut self) {
        if !self.headers.contains_key(CONTENT_LENGTH) {
            if let Ok(len) = HeaderValue::from_str(&self.body.len().to_string()) {
                self.headers.insert(CONTENT_LENGTH, len);
            }
        }
    }
}

impl From<AssetError> for AssetResponse {
    fn from(err: AssetError) -> Self {
        let status = err.status_code();
        if status == StatusCode::NOT_FOUND {
            return AssetResponse::not_found();
        }
        let reason = status.canonical_reason().unwrap_or("Unknown Status");
        AssetResponse::text(format!("{} {reason}\n", status.as_u16())).with_status(status)
    }
}
