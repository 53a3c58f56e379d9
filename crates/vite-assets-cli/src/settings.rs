use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use vite_assets::{load_config, Environment, ViteConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub project_path: Option<String>,
    pub environment: Option<Environment>,
    pub https: Option<bool>,
    pub dev_server_domain: Option<String>,
    pub dev_server_port: Option<String>,
    pub url_prefix: Option<String>,
    pub assets_path: Option<String>,
    pub entry_point: Option<String>,
    pub debug: Option<bool>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.project_path.is_none()
            && self.environment.is_none()
            && self.https.is_none()
            && self.dev_server_domain.is_none()
            && self.dev_server_port.is_none()
            && self.url_prefix.is_none()
            && self.assets_path.is_none()
            && self.entry_point.is_none()
            && self.debug.is_none()
    }

    pub fn apply(&self, config: &mut ViteConfig) {
        if let Some(project_path) = self.project_path.clone() {
            config.project_path = project_path;
        }
        if let Some(environment) = self.environment.clone() {
            config.environment = environment;
        }
        if let Some(https) = self.https {
            config.https = https;
        }
        if let Some(domain) = self.dev_server_domain.clone() {
            config.dev_server_domain = domain;
        }
        if let Some(port) = self.dev_server_port.clone() {
            config.dev_server_port = port;
        }
        if let Some(prefix) = self.url_prefix.clone() {
            config.url_prefix = prefix;
        }
        if let Some(assets_path) = self.assets_path.clone() {
            config.assets_path = assets_path;
        }
        if let Some(entry_point) = self.entry_point.clone() {
            config.entry_point = entry_point;
        }
        if let Some(debug) = self.debug {
            config.debug = debug;
        }
    }
}

/// Load the YAML config at `path` if one was given, then apply the CLI
/// overrides on top.
pub async fn load_settings(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ViteConfig> {
    let mut config = match path {
        Some(path) => load_config(path)
            .await
            .with_context(|| format!("config {} is not usable", path.display()))?,
        None => ViteConfig::default(),
    };
    if !overrides.is_empty() {
        overrides.apply(&mut config);
    }
    Ok(config)
}

/// Directory that should be opened as the live asset store.
///
/// Live stores are rooted at the frontend project, so a relative
/// `project_path` is resolved against `base`.
pub fn project_dir(base: &Path, project_path: &str) -> PathBuf {
    let project = Path::new(project_path);
    if project.is_absolute() {
        project.to_path_buf()
    } else {
        base.join(project)
    }
}
