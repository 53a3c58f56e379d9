use async_trait::async_trait;
use http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, StatusCode};
use tracing::debug;

use crate::error::AssetResult;
use crate::guard::INDEX_FILE;
use crate::handler::AssetHandler;
use crate::request::AssetRequest;
use crate::response::AssetResponse;
use crate::store::{join_path, DynStore, ROOT};

/// Serves files from a store. The request path must already be relative to
/// the store root; no prefix is removed here.
#[derive(Clone)]
pub struct FileServer {
    store: DynStore,
}

impl FileServer {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    async fn serve_file(&self, method: &Method, path: &str, size: u64) -> AssetResponse {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let mut response = AssetResponse::ok();
        response.set_header(
            CONTENT_TYPE,
            HeaderValue::from_str(mime.essence_str())
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
        );

        if *method == Method::HEAD {
            let content_length = HeaderValue::from_str(&size.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("0"));
            response.set_header(CONTENT_LENGTH, content_length);
            return response;
        }

        match self.store.read(path).await {
            Ok(bytes) => response.with_body(bytes),
            Err(err) => {
                debug!(target: "vite_assets::fs", path, error = %err, "failed to read asset");
                AssetResponse::not_found()
            }
        }
    }
}

#[async_trait]
impl AssetHandler for FileServer {
    async fn handle(&self, request: AssetRequest) -> AssetResult<AssetResponse> {
        let method = request.method();
        if *method != Method::GET && *method != Method::HEAD {
            let response = AssetResponse::text(format!("Method {method} is not supported"))
                .with_status(StatusCode::METHOD_NOT_ALLOWED);
            return Ok(response);
        }

        let path = match request.path().trim_matches('/') {
            "" => ROOT,
            path => path,
        };

        let meta = match self.store.metadata(path).await {
            Ok(meta) => meta,
            Err(err) => {
                debug!(target: "vite_assets::fs", path, error = %err, "asset lookup failed");
                return Ok(AssetResponse::not_found());
            }
        };

        if !meta.is_dir() {
            return Ok(self.serve_file(method, path, meta.len).await);
        }

        let index = join_path(path, INDEX_FILE);
        match self.store.metadata(&index).await {
            Ok(index_meta) if !index_meta.is_dir() => {
                Ok(self.serve_file(method, &index, index_meta.len).await)
            }
            _ => Ok(AssetResponse::not_found()),
        }
    }
}
