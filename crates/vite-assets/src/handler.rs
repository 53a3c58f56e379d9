use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::access_log::{strip_line_breaks, AccessLog};
use crate::config::ViteConfig;
use crate::error::{AssetError, AssetResult};
use crate::file_server::FileServer;
use crate::guard::GuardedStore;
use crate::request::AssetRequest;
use crate::response::AssetResponse;
use crate::store::{sub_store, DynStore, ROOT};
use crate::support::{find_support_file, BundledSupport, SupportFile, SupportFiles};

/// Prefix removed from every request path before it reaches a store.
pub const MOUNT_PREFIX: &str = "/";

#[async_trait]
pub trait AssetHandler: Send + Sync {
    async fn handle(&self, request: AssetRequest) -> AssetResult<AssetResponse>;
}

/// Builds the asset handler for a resolved [`ViteConfig`].
pub struct AssetServer {
    config: Arc<ViteConfig>,
    store: DynStore,
    support: Arc<dyn SupportFiles>,
}

impl AssetServer {
    pub fn new(config: Arc<ViteConfig>, store: DynStore) -> Self {
        Self {
            config,
            store,
            support: Arc::new(BundledSupport),
        }
    }

    pub fn with_support_files(mut self, support: Arc<dyn SupportFiles>) -> Self {
        self.support = support;
        self
    }

    /// Wrap the store in the index guard and return the request handler.
    ///
    /// Bundled stores contain the project directory itself, so they are
    /// re-rooted at [`ViteConfig::project_path`] first.
    pub fn file_server(&self) -> AssetResult<ViteHandler> {
        let target = if self.store.is_bundled() {
            sub_store(self.store.clone(), &self.config.project_path).map_err(|err| {
                AssetError::Config(format!(
                    "cannot serve bundled project '{}': {err}",
                    self.config.project_path
                ))
            })?
        } else {
            self.store.clone()
        };
        let root: DynStore = Arc::new(GuardedStore::new(target));
        Ok(ViteHandler {
            config: Arc::clone(&self.config),
            development: AccessLog::new(FileServer::new(Arc::clone(&root))),
            root,
            support: Arc::clone(&self.support),
        })
    }
}

/// Serves the frontend project in development and its build output in
/// production. Hidden paths are refused in both modes.
pub struct ViteHandler {
    config: Arc<ViteConfig>,
    root: DynStore,
    development: AccessLog<FileServer>,
    support: Arc<dyn SupportFiles>,
}

impl ViteHandler {
    pub fn config(&self) -> &ViteConfig {
        &self.config
    }

    /// Handle a request. Every failure is answered with a not-found page.
    pub async fn serve(&self, request: AssetRequest) -> AssetResponse {
        let Some(rest) = request.path().strip_prefix(MOUNT_PREFIX) else {
            return AssetResponse::not_found();
        };
        let segments: Vec<&str> = rest.split('/').collect();

        if segments.iter().any(|segment| segment.starts_with('.')) {
            debug!(
                target: "vite_assets::handler",
                path = %strip_line_breaks(request.path()),
                "refusing hidden path"
            );
            return AssetResponse::not_found();
        }

        if let Some(file) = segments.last().and_then(|name| find_support_file(name)) {
            return self.serve_support_file(file);
        }

        let relative = segments
            .iter()
            .filter(|segment| !segment.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/");

        if self.config.debug {
            self.log_root_entries(&request).await;
        }

        let request = request.with_path(relative);
        let result = if self.config.environment.is_production() {
            let dist = match sub_store(Arc::clone(&self.root), &self.config.assets_path) {
                Ok(dist) => dist,
                Err(err) => {
                    debug!(
                        target: "vite_assets::handler",
                        assets_path = %self.config.assets_path,
                        error = %err,
                        "cannot open build output"
                    );
                    return AssetResponse::not_found();
                }
            };
            AccessLog::new(FileServer::new(dist)).handle(request).await
        } else {
            self.development.handle(request).await
        };

        result.unwrap_or_else(AssetResponse::from)
    }

    fn serve_support_file(&self, file: &SupportFile) -> AssetResponse {
        match self.support.load(file.resource) {
            Some(bytes) => AssetResponse::bytes(bytes, file.content_type),
            None => {
                warn!(
                    target: "vite_assets::handler",
                    resource = file.resource,
                    "support file missing from bundle"
                );
                AssetResponse::not_found()
            }
        }
    }

    async fn log_root_entries(&self, request: &AssetRequest) {
        debug!(
            target: "vite_assets::handler",
            path = %strip_line_breaks(request.path()),
            "entered asset store"
        );
        match self.root.read_dir(ROOT).await {
            Ok(entries) => {
                for entry in entries {
                    debug!(target: "vite_assets::handler", name = %entry.name, kind = ?entry.kind);
                }
            }
            Err(err) => {
                debug!(target: "vite_assets::handler", error = %err, "could not list asset store");
            }
        }
    }
}

#[async_trait]
impl AssetHandler for ViteHandler {
    async fn handle(&self, request: AssetRequest) -> AssetResult<AssetResponse> {
        Ok(self.serve(request).await)
    }
}
