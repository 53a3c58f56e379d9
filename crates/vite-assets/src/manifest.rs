//! `package.json` parsing and framework detection.
//!
//! The analyzer only looks at dependency names and version ranges. It never
//! reads `vite.config.*` or any source file, so everything it reports is a
//! best guess that operators can override through [`crate::ViteConfig`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{AssetError, AssetResult};
use crate::store::{join_path, FileStore};

pub const MANIFEST_FILE: &str = "package.json";
pub const VITE_PACKAGE: &str = "vite";
pub const TYPESCRIPT_PACKAGE: &str = "typescript";

static SEMVER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\^*((\d+)\.\d+\.\d+)$").unwrap());

/// The subset of `package.json` the analyzer cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, rename = "type")]
    pub module_type: String,
    #[serde(default)]
    pub scripts: HashMap<String, String>,
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: HashMap<String, String>,
}

impl PackageJson {
    pub fn from_slice(bytes: &[u8]) -> AssetResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read `package.json` from `store`.
    ///
    /// Bundled stores are rooted above the frontend project, so the manifest
    /// lives under `project_path`. Live directory stores are opened at the
    /// project itself and keep the manifest at their root.
    pub async fn load(store: &dyn FileStore, project_path: &str) -> AssetResult<Self> {
        let path = manifest_path(store, project_path);
        let bytes = store.read(&path).await?;
        Self::from_slice(&bytes)
    }
}

pub fn manifest_path(store: &dyn FileStore, project_path: &str) -> String {
    if store.is_bundled() {
        join_path(project_path.trim_matches('/'), MANIFEST_FILE)
    } else {
        MANIFEST_FILE.to_string()
    }
}

/// A version range reduced to `major.minor.patch` and its major component.
///
/// Ranges the pattern does not understand (`~1.2.3`, `latest`, `workspace:*`)
/// produce empty strings rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    pub full: String,
    pub major: String,
}

impl Version {
    pub fn parse(raw: &str) -> Self {
        match SEMVER.captures(raw) {
            Some(caps) => Self {
                full: caps[1].to_string(),
                major: caps[2].to_string(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DependencySection {
    Runtime,
    Development,
}

/// UI framework detected in a Vite project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framework {
    Vue(Version),
    React(Version),
    Preact(Version),
    Svelte(Version),
    Lit(Version),
    Vanilla,
}

// Svelte projects keep the compiler in devDependencies and usually have no
// runtime dependency on it at all.
const FRAMEWORK_PRIORITY: [(&str, DependencySection, fn(Version) -> Framework); 5] = [
    ("vue", DependencySection::Runtime, Framework::Vue),
    ("react", DependencySection::Runtime, Framework::React),
    ("preact", DependencySection::Runtime, Framework::Preact),
    ("svelte", DependencySection::Development, Framework::Svelte),
    ("lit", DependencySection::Runtime, Framework::Lit),
];

impl Framework {
    pub fn name(&self) -> &'static str {
        match self {
            Framework::Vue(_) => "vue",
            Framework::React(_) => "react",
            Framework::Preact(_) => "preact",
            Framework::Svelte(_) => "svelte",
            Framework::Lit(_) => "lit",
            Framework::Vanilla => "vanilla",
        }
    }

    pub fn version(&self) -> Option<&Version> {
        match self {
            Framework::Vue(version)
            | Framework::React(version)
            | Framework::Preact(version)
            | Framework::Svelte(version)
            | Framework::Lit(version) => Some(version),
            Framework::Vanilla => None,
        }
    }

    /// Conventional entry point of the matching `create-vite` template.
    ///
    /// Vanilla is the odd one out: the JavaScript template keeps `main.js`
    /// at the project root while the TypeScript one nests it under `src/`.
    /// Lit is left empty because its templates disagree on a layout.
    pub fn entry_point(&self, has_typescript: bool) -> &'static str {
        match (self, has_typescript) {
            (Framework::Vue(_) | Framework::Svelte(_), false) => "src/main.js",
            (Framework::Vue(_) | Framework::Svelte(_), true) => "src/main.ts",
            (Framework::React(_) | Framework::Preact(_), false) => "src/main.jsx",
            (Framework::React(_) | Framework::Preact(_), true) => "src/main.tsx",
            (Framework::Lit(_), _) => "",
            (Framework::Vanilla, false) => "main.js",
            (Framework::Vanilla, true) => "src/main.ts",
        }
    }

    fn detect(package: &PackageJson) -> Self {
        for (name, section, build) in FRAMEWORK_PRIORITY {
            let deps = match section {
                DependencySection::Runtime => &package.dependencies,
                DependencySection::Development => &package.dev_dependencies,
            };
            if let Some(raw) = deps.get(name) {
                return build(Version::parse(raw));
            }
        }
        Framework::Vanilla
    }
}

/// Everything the analyzer could infer about a frontend project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkProfile {
    framework: Framework,
    vite: Version,
    has_typescript: bool,
    entry_point: String,
}

impl FrameworkProfile {
    pub fn framework(&self) -> &Framework {
        &self.framework
    }

    pub fn platform(&self) -> &'static str {
        self.framework.name()
    }

    pub fn is_vanilla(&self) -> bool {
        matches!(self.framework, Framework::Vanilla)
    }

    pub fn has_typescript(&self) -> bool {
        self.has_typescript
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn vite_version(&self) -> &str {
        &self.vite.full
    }

    pub fn vite_major_version(&self) -> &str {
        &self.vite.major
    }

    /// Full version of the detected framework, empty for vanilla projects.
    pub fn framework_version(&self) -> &str {
        self.framework
            .version()
            .map(|v| v.full.as_str())
            .unwrap_or_default()
    }

    pub fn major_version(&self) -> &str {
        self.framework
            .version()
            .map(|v| v.major.as_str())
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct ProfileRecord<'a> {
    vite_version: &'a str,
    vite_major_version: &'a str,
    package_type: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    major_version: &'a str,
    entry_point: &'a str,
    has_ts: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_vanilla: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    vue_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    react_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preact_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    svelte_version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lit_version: Option<&'a str>,
}

fn is_empty(value: &&str) -> bool {
    value.is_empty()
}

impl Serialize for FrameworkProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let version = Some(self.framework_version()).filter(|v| !v.is_empty());
        let pick = |wanted: bool| if wanted { version } else { None };
        ProfileRecord {
            vite_version: self.vite_version(),
            vite_major_version: self.vite_major_version(),
            package_type: self.platform(),
            major_version: self.major_version(),
            entry_point: self.entry_point(),
            has_ts: self.has_typescript,
            is_vanilla: self.is_vanilla(),
            vue_version: pick(matches!(self.framework, Framework::Vue(_))),
            react_version: pick(matches!(self.framework, Framework::React(_))),
            preact_version: pick(matches!(self.framework, Framework::Preact(_))),
            svelte_version: pick(matches!(self.framework, Framework::Svelte(_))),
            lit_version: pick(matches!(self.framework, Framework::Lit(_))),
        }
        .serialize(serializer)
    }
}

/// Infer a [`FrameworkProfile`] from a parsed `package.json`.
///
/// Fails with [`AssetError::NotViteProject`] when `vite` is missing from
/// `devDependencies`.
pub fn analyze(package: &PackageJson) -> AssetResult<FrameworkProfile> {
    let vite = package
        .dev_dependencies
        .get(VITE_PACKAGE)
        .map(|raw| Version::parse(raw))
        .ok_or(AssetError::NotViteProject)?;
    let has_typescript = package.dev_dependencies.contains_key(TYPESCRIPT_PACKAGE);
    let framework = Framework::detect(package);
    let entry_point = framework.entry_point(has_typescript).to_string();
    Ok(FrameworkProfile {
        framework,
        vite,
        has_typescript,
        entry_point,
    })
}
