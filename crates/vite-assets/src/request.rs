use std::net::SocketAddr;

use http::{request::Parts, Method, Version};
use percent_encoding::percent_decode_str;

#[derive(Clone, Debug)]
pub struct AssetRequest {
    method: Method,
    path: String,
    target: String,
    version: Version,
    peer: SocketAddr,
}

impl AssetRequest {
    pub fn new(method: Method, target: &str, peer: SocketAddr) -> Self {
        Self {
            method,
            path: decode_path(target),
            target: target.to_string(),
            version: Version::HTTP_11,
            peer,
        }
    }

    pub fn from_parts(parts: &Parts, peer: SocketAddr) -> Self {
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        Self {
            method: parts.method.clone(),
            path: decode_path(parts.uri.path()),
            target,
            version: parts.version,
            peer,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Percent-decoded request path. After the asset handler has consumed
    /// its mount prefix this is relative to the serving root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request target exactly as received, query string included.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) fn with_path(mut self, path: String) -> Self {
        self.path = path;
        self
    }
}

fn decode_path(target: &str) -> String {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}
