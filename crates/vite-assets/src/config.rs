use std::convert::Infallible;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{AssetError, AssetResult};
use crate::manifest::{analyze, FrameworkProfile, PackageJson};
use crate::store::FileStore;

/// Vite major version assumed when none could be detected.
pub const DEFAULT_VITE_VERSION: &str = "3";
pub const DEFAULT_PORT_V2: &str = "3000";
pub const DEFAULT_PORT_V3: &str = "5173";
pub const DEFAULT_PROJECT_PATH: &str = "frontend";
pub const DEFAULT_ASSETS_PATH: &str = "dist";
pub const DEFAULT_DEV_URL_PREFIX: &str = "/src/";
pub const DEFAULT_PROD_URL_PREFIX: &str = "/assets/";
pub const DEFAULT_DEV_SERVER_DOMAIN: &str = "localhost";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    #[default]
    Development,
    Production,
    /// Anything unrecognised. Served exactly like development.
    Other(String),
}

impl Environment {
    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Other(value) => value,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        match value.as_str() {
            "development" => Environment::Development,
            "production" => Environment::Production,
            _ => Environment::Other(value),
        }
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Environment::from(s.to_string()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime settings for serving a Vite project.
///
/// String fields use the empty string for "unset". The resolution passes
/// only ever fill unset fields, so operator supplied values always win and
/// running a pass twice changes nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViteConfig {
    /// Frontend project directory, relative to the store root.
    pub project_path: String,
    pub environment: Environment,
    /// Use `https` when building the dev server URL.
    pub https: bool,
    pub dev_server_domain: String,
    pub dev_server_port: String,
    /// URL path the asset handler is mounted under.
    pub url_prefix: String,
    /// Build output directory served in production.
    pub assets_path: String,
    pub vite_version: String,
    pub platform: String,
    pub entry_point: String,
    /// List the serving root on every request at debug level.
    pub debug: bool,
    #[serde(skip)]
    profile: Option<FrameworkProfile>,
}

fn fill(field: &mut String, value: &str) {
    if field.is_empty() {
        *field = value.to_string();
    }
}

impl ViteConfig {
    pub fn from_yaml_str(source: &str) -> AssetResult<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn profile(&self) -> Option<&FrameworkProfile> {
        self.profile.as_ref()
    }

    /// Run the resolution pass that matches [`ViteConfig::environment`].
    pub async fn resolve(&mut self, store: &dyn FileStore) -> AssetResult<()> {
        if self.environment.is_production() {
            self.set_production_defaults();
            Ok(())
        } else {
            self.set_development_defaults(store).await
        }
    }

    /// Fill unset fields from the project's `package.json`.
    ///
    /// The manifest is only analyzed while no profile is cached, so a second
    /// call neither touches the store nor changes any field.
    pub async fn set_development_defaults(&mut self, store: &dyn FileStore) -> AssetResult<()> {
        fill(&mut self.project_path, DEFAULT_PROJECT_PATH);

        let profile = match self.profile.take() {
            Some(profile) => profile,
            None => {
                let package = PackageJson::load(store, &self.project_path).await?;
                let profile = analyze(&package)?;
                debug!(
                    target: "vite_assets::config",
                    platform = profile.platform(),
                    vite = profile.vite_version(),
                    entry_point = profile.entry_point(),
                    "analyzed package.json"
                );
                profile
            }
        };

        let detected_major = profile.vite_major_version();
        let vite_version = if detected_major.is_empty() {
            DEFAULT_VITE_VERSION
        } else {
            detected_major
        };
        fill(&mut self.vite_version, vite_version);
        fill(&mut self.platform, profile.platform());
        fill(&mut self.entry_point, profile.entry_point());
        self.profile = Some(profile);
        fill(&mut self.url_prefix, DEFAULT_DEV_URL_PREFIX);

        let port = if self.vite_major() == "2" {
            DEFAULT_PORT_V2
        } else {
            DEFAULT_PORT_V3
        };
        fill(&mut self.dev_server_port, port);
        fill(&mut self.dev_server_domain, DEFAULT_DEV_SERVER_DOMAIN);
        Ok(())
    }

    /// Fill unset fields for serving a finished build. The manifest is not
    /// consulted.
    pub fn set_production_defaults(&mut self) {
        fill(&mut self.project_path, DEFAULT_PROJECT_PATH);
        fill(&mut self.assets_path, DEFAULT_ASSETS_PATH);
        fill(&mut self.url_prefix, DEFAULT_PROD_URL_PREFIX);
    }

    /// `scheme://domain:port` of the Vite dev server.
    pub fn dev_server_base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!(
            "{scheme}://{}:{}",
            self.dev_server_domain, self.dev_server_port
        )
    }

    fn vite_major(&self) -> &str {
        self.vite_version.split('.').next().unwrap_or_default()
    }
}

/// Read a YAML config file.
pub async fn load_config(path: &Path) -> AssetResult<ViteConfig> {
    let source = tokio::fs::read_to_string(path).await.map_err(|err| {
        AssetError::Config(format!("failed to read config {}: {err}", path.display()))
    })?;
    ViteConfig::from_yaml_str(&source)
}

/// A config that is resolved at most once, however many callers race for it.
pub struct SharedConfig {
    seed: ViteConfig,
    resolved: OnceCell<Arc<ViteConfig>>,
}

impl SharedConfig {
    pub fn new(seed: ViteConfig) -> Self {
        Self {
            seed,
            resolved: OnceCell::new(),
        }
    }

    /// The resolved config, if resolution has already succeeded.
    pub fn get(&self) -> Option<Arc<ViteConfig>> {
        self.resolved.get().cloned()
    }

    /// Resolve on first use. A failed resolution is not cached; the next
    /// caller tries again.
    pub async fn get_or_resolve(&self, store: &dyn FileStore) -> AssetResult<Arc<ViteConfig>> {
        self.resolved
            .get_or_try_init(|| async {
                let mut config = self.seed.clone();
                config.resolve(store).await?;
                Ok::<_, AssetError>(Arc::new(config))
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn react_project() -> MemoryStore {
        MemoryStore::new().with_file(
            "package.json",
            r#"{
                "name": "app",
                "devDependencies": { "vite": "^4.1.0", "typescript": "1.0.0" },
                "dependencies": { "react": "18.2.0" }
            }"#,
        )
    }

    #[tokio::test]
    async fn development_defaults_from_manifest() {
        let mut config = ViteConfig::default();
        config
            .set_development_defaults(&react_project())
            .await
            .unwrap();
        assert_eq!(config.project_path, "frontend");
        assert_eq!(config.platform, "react");
        assert_eq!(config.entry_point, "src/main.tsx");
        assert_eq!(config.url_prefix, "/src/");
        assert_eq!(config.vite_version, "4");
        assert_eq!(config.dev_server_port, DEFAULT_PORT_V3);
        assert_eq!(config.dev_server_domain, "localhost");
        assert_eq!(config.dev_server_base_url(), "http://localhost:5173");
        assert!(config.profile().is_some());
    }

    #[tokio::test]
    async fn operator_values_win() {
        let mut config = ViteConfig {
            platform: "vue".into(),
            entry_point: "web/boot.ts".into(),
            url_prefix: "/static/".into(),
            dev_server_port: "8080".into(),
            dev_server_domain: "vite.internal".into(),
            https: true,
            ..ViteConfig::default()
        };
        config
            .set_development_defaults(&react_project())
            .await
            .unwrap();
        assert_eq!(config.platform, "vue");
        assert_eq!(config.entry_point, "web/boot.ts");
        assert_eq!(config.url_prefix, "/static/");
        assert_eq!(config.dev_server_base_url(), "https://vite.internal:8080");
    }

    #[tokio::test]
    async fn development_pass_is_idempotent() {
        let store = react_project();
        let mut config = ViteConfig::default();
        config.set_development_defaults(&store).await.unwrap();
        let first = format!("{config:?}");
        // The manifest is not read again, so an empty store is fine.
        config
            .set_development_defaults(&MemoryStore::new())
            .await
            .unwrap();
        assert_eq!(format!("{config:?}"), first);
    }

    #[tokio::test]
    async fn vite_two_uses_legacy_port() {
        let store = MemoryStore::new().with_file(
            "package.json",
            r#"{ "devDependencies": { "vite": "^2.9.15" }, "dependencies": { "vue": "^3.2.37" } }"#,
        );
        let mut config = ViteConfig::default();
        config.set_development_defaults(&store).await.unwrap();
        assert_eq!(config.vite_version, "2");
        assert_eq!(config.dev_server_port, DEFAULT_PORT_V2);
        assert_eq!(config.entry_point, "src/main.js");
    }

    #[tokio::test]
    async fn unparseable_vite_version_falls_back() {
        let store = MemoryStore::new().with_file(
            "package.json",
            r#"{ "devDependencies": { "vite": "latest" } }"#,
        );
        let mut config = ViteConfig::default();
        config.set_development_defaults(&store).await.unwrap();
        assert_eq!(config.vite_version, DEFAULT_VITE_VERSION);
        assert_eq!(config.dev_server_port, DEFAULT_PORT_V3);
        assert_eq!(config.platform, "vanilla");
        assert_eq!(config.entry_point, "main.js");
    }

    #[tokio::test]
    async fn bundled_store_reads_manifest_under_project() {
        let store = MemoryStore::new()
            .with_file(
                "web/package.json",
                r#"{ "devDependencies": { "vite": "4.0.0", "typescript": "4.9.0" } }"#,
            )
            .bundled();
        let mut config = ViteConfig {
            project_path: "web".into(),
            ..ViteConfig::default()
        };
        config.set_development_defaults(&store).await.unwrap();
        assert_eq!(config.entry_point, "src/main.ts");

        let mut defaulted = ViteConfig::default();
        let err = defaulted
            .set_development_defaults(&store)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[tokio::test]
    async fn manifest_errors_surface() {
        let mut config = ViteConfig::default();
        let err = config
            .set_development_defaults(&MemoryStore::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));

        let broken = MemoryStore::new().with_file("package.json", "{ not json");
        let err = config.set_development_defaults(&broken).await.unwrap_err();
        assert!(matches!(err, AssetError::Json(_)));

        let plain = MemoryStore::new().with_file(
            "package.json",
            r#"{ "dependencies": { "react": "18.2.0" } }"#,
        );
        let err = config.set_development_defaults(&plain).await.unwrap_err();
        assert!(matches!(err, AssetError::NotViteProject));
        assert!(config.profile().is_none());
    }

    #[test]
    fn production_defaults_are_idempotent() {
        let mut config = ViteConfig {
            environment: Environment::Production,
            assets_path: "build".into(),
            ..ViteConfig::default()
        };
        config.set_production_defaults();
        assert_eq!(config.project_path, "frontend");
        assert_eq!(config.assets_path, "build");
        assert_eq!(config.url_prefix, "/assets/");
        let first = format!("{config:?}");
        config.set_production_defaults();
        assert_eq!(format!("{config:?}"), first);
        assert!(config.profile().is_none());
    }

    #[test]
    fn base_url_scheme_follows_https_flag() {
        let mut config = ViteConfig {
            dev_server_domain: "localhost".into(),
            dev_server_port: "5173".into(),
            ..ViteConfig::default()
        };
        assert_eq!(config.dev_server_base_url(), "http://localhost:5173");
        config.https = true;
        assert_eq!(config.dev_server_base_url(), "https://localhost:5173");
    }

    #[test]
    fn loads_yaml_with_unknown_environment() {
        let config = ViteConfig::from_yaml_str(
            "environment: staging\nproject_path: web\nhttps: true\ndebug: true\n",
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Other("staging".into()));
        assert!(!config.environment.is_production());
        assert_eq!(config.project_path, "web");
        assert!(config.https && config.debug);

        let config = ViteConfig::from_yaml_str("environment: production").unwrap();
        assert!(config.environment.is_production());
        assert!(ViteConfig::from_yaml_str("https: [").is_err());
    }

    #[tokio::test]
    async fn shared_config_resolves_once() {
        let shared = SharedConfig::new(ViteConfig::default());
        assert!(shared.get().is_none());
        assert!(shared.get_or_resolve(&MemoryStore::new()).await.is_err());
        assert!(shared.get().is_none());

        let first = shared.get_or_resolve(&react_project()).await.unwrap();
        let second = shared.get_or_resolve(&MemoryStore::new()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.platform, "react");
    }
}
