//! Support files answered from a bundled resource instead of the project tree.

use std::collections::HashMap;

use bytes::Bytes;
use rust_embed::RustEmbed;

use crate::embedded::cow_bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportFile {
    /// File name matched against the last segment of the request path.
    pub name: &'static str,
    /// Key of the file inside the support bundle.
    pub resource: &'static str,
    pub content_type: &'static str,
}

/// `@vitejs/plugin-react` refuses to run without this preamble when the page
/// is not rendered by Vite itself.
pub const REACT_PREAMBLE: SupportFile = SupportFile {
    name: "preamble.js",
    resource: "react/preamble.js",
    content_type: "application/javascript",
};

pub const SUPPORT_FILES: &[SupportFile] = &[REACT_PREAMBLE];

pub fn find_support_file(name: &str) -> Option<&'static SupportFile> {
    SUPPORT_FILES.iter().find(|file| file.name == name)
}

/// Read-only source for support file contents.
pub trait SupportFiles: Send + Sync {
    fn load(&self, resource: &str) -> Option<Bytes>;
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct SupportBundle;

/// Support files compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSupport;

impl SupportFiles for BundledSupport {
    fn load(&self, resource: &str) -> Option<Bytes> {
        SupportBundle::get(resource).map(|file| cow_bytes(file.data))
    }
}

impl SupportFiles for HashMap<String, Bytes> {
    fn load(&self, resource: &str) -> Option<Bytes> {
        self.get(resource).cloned()
    }
}
