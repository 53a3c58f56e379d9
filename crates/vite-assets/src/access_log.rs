use async_trait::async_trait;
use http::StatusCode;
use tracing::info;

use crate::error::AssetResult;
use crate::handler::AssetHandler;
use crate::request::AssetRequest;
use crate::response::AssetResponse;

/// Wraps a handler and logs one line per request once it has finished.
#[derive(Clone, Debug)]
pub struct AccessLog<H> {
    inner: H,
}

impl<H> AccessLog<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<H: AssetHandler> AssetHandler for AccessLog<H> {
    async fn handle(&self, request: AssetRequest) -> AssetResult<AssetResponse> {
        let line_request = request.clone();
        let result = self.inner.handle(request).await;
        let status = match &result {
            Ok(response) => response.status(),
            Err(err) => err.status_code(),
        };
        info!(target: "vite_assets::access", "{}", access_line(&line_request, status));
        result
    }
}

/// `"{peer} - {protocol} {method} {target} ({status})"`, with CR and LF
/// removed from the client-controlled target.
pub fn access_line(request: &AssetRequest, status: StatusCode) -> String {
    format!(
        "{} - {:?} {} {} ({})",
        request.peer(),
        request.version(),
        request.method(),
        strip_line_breaks(request.target()),
        status.as_u16()
    )
}

pub fn strip_line_breaks(value: &str) -> String {
    value.replace(['\r', '\n'], "")
}
