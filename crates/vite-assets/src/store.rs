//! Read-only hierarchical file stores.
//!
//! Paths handed to a [`FileStore`] are relative and slash separated. The
//! root is `"."` (an empty path is accepted as an alias). Elements may not be
//! empty, `.` or `..`, and the path may not start or end with `/`.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::error::{AssetError, AssetResult};

pub const ROOT: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub kind: EntryKind,
    pub len: u64,
}

impl Metadata {
    pub fn file(len: u64) -> Self {
        Self {
            kind: EntryKind::File,
            len,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: EntryKind::Directory,
            len: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

pub type DynStore = Arc<dyn FileStore>;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Open `path` and report what kind of entry it is.
    async fn metadata(&self, path: &str) -> io::Result<Metadata>;

    async fn read(&self, path: &str) -> io::Result<Bytes>;

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>>;

    /// Whether the store was bundled into the binary. Bundled stores are
    /// rooted above the frontend project rather than at it.
    fn is_bundled(&self) -> bool {
        false
    }
}

/// Join a store path and a child name.
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() || base == ROOT {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || path == ROOT {
        return true;
    }
    path.split('/')
        .all(|element| !element.is_empty() && element != "." && element != "..")
}

fn invalid_path(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("invalid store path '{path}'"),
    )
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("'{path}' does not exist"))
}

pub(crate) fn checked(path: &str) -> io::Result<&str> {
    if !is_valid_path(path) {
        return Err(invalid_path(path));
    }
    Ok(if path.is_empty() { ROOT } else { path })
}

/// View of `store` rooted at `dir`.
///
/// Fails only when `dir` is not a valid store path; the directory itself is
/// not required to exist.
pub fn sub_store(store: DynStore, dir: &str) -> io::Result<DynStore> {
    let dir = checked(dir.trim_matches('/'))?;
    if dir == ROOT {
        return Ok(store);
    }
    Ok(Arc::new(SubStore {
        inner: store,
        prefix: dir.to_string(),
    }))
}

struct SubStore {
    inner: DynStore,
    prefix: String,
}

impl SubStore {
    fn full(&self, path: &str) -> io::Result<String> {
        let path = checked(path)?;
        if path == ROOT {
            return Ok(self.prefix.clone());
        }
        Ok(join_path(&self.prefix, path))
    }
}

#[async_trait]
impl FileStore for SubStore {
    async fn metadata(&self, path: &str) -> io::Result<Metadata> {
        self.inner.metadata(&self.full(path)?).await
    }

    async fn read(&self, path: &str) -> io::Result<Bytes> {
        self.inner.read(&self.full(path)?).await
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        self.inner.read_dir(&self.full(path)?).await
    }

    fn is_bundled(&self) -> bool {
        self.inner.is_bundled()
    }
}

/// Store backed by a live directory on disk.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> AssetResult<Self> {
        let root = root.into();
        let canonical = std::fs::canonicalize(&root).map_err(|err| {
            AssetError::Config(format!(
                "failed to canonicalize asset directory {}: {err}",
                root.display()
            ))
        })?;
        Ok(Self { root: canonical })
    }

    async fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let path = checked(path)?;
        let mut full = self.root.clone();
        if path != ROOT {
            full.push(path);
        }
        let canonical = fs::canonicalize(&full).await?;
        // Symlinks may point outside the root.
        if !canonical.starts_with(&self.root) {
            return Err(not_found(path));
        }
        Ok(canonical)
    }
}

#[async_trait]
impl FileStore for DirStore {
    async fn metadata(&self, path: &str) -> io::Result<Metadata> {
        let full = self.resolve(path).await?;
        let meta = fs::metadata(&full).await?;
        Ok(if meta.is_dir() {
            Metadata::directory()
        } else {
            Metadata::file(meta.len())
        })
    }

    async fn read(&self, path: &str) -> io::Result<Bytes> {
        let full = self.resolve(path).await?;
        Ok(Bytes::from(fs::read(&full).await?))
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let full = self.resolve(path).await?;
        let mut entries = fs::read_dir(&full).await?;
        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            items.push(DirEntry { name, kind });
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

/// In-memory store. Directories exist implicitly for every file beneath them.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, Bytes>,
    bundled: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, contents: impl Into<Bytes>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: &str, contents: impl Into<Bytes>) {
        self.files
            .insert(path.trim_matches('/').to_string(), contents.into());
    }

    /// Mark the store as bundled, as if it had been compiled into the binary.
    pub fn bundled(mut self) -> Self {
        self.bundled = true;
        self
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn metadata(&self, path: &str) -> io::Result<Metadata> {
        let path = checked(path)?;
        if let Some(bytes) = self.files.get(path) {
            return Ok(Metadata::file(bytes.len() as u64));
        }
        if is_implicit_dir(self.files.keys(), path) {
            return Ok(Metadata::directory());
        }
        Err(not_found(path))
    }

    async fn read(&self, path: &str) -> io::Result<Bytes> {
        let path = checked(path)?;
        match self.files.get(path) {
            Some(bytes) => Ok(bytes.clone()),
            None if is_implicit_dir(self.files.keys(), path) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{path}' is a directory"),
            )),
            None => Err(not_found(path)),
        }
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let path = checked(path)?;
        implicit_dir_entries(self.files.keys(), path)
    }

    fn is_bundled(&self) -> bool {
        self.bundled
    }
}

/// True when `dir` is the root or some name lives underneath it.
pub(crate) fn is_implicit_dir<I, S>(names: I, dir: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if dir == ROOT {
        return true;
    }
    let prefix = format!("{dir}/");
    names
        .into_iter()
        .any(|name| name.as_ref().starts_with(&prefix))
}

pub(crate) fn implicit_dir_entries<I, S>(names: I, dir: &str) -> io::Result<Vec<DirEntry>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let prefix = if dir == ROOT {
        String::new()
    } else {
        format!("{dir}/")
    };
    let mut seen = false;
    let mut dirs = BTreeSet::new();
    let mut files = BTreeSet::new();
    for name in names {
        let Some(rest) = name.as_ref().strip_prefix(prefix.as_str()) else {
            continue;
        };
        seen = true;
        match rest.split_once('/') {
            Some((child, _)) => {
                dirs.insert(child.to_string());
            }
            None => {
                files.insert(rest.to_string());
            }
        }
    }
    if !seen && dir != ROOT {
        return Err(not_found(dir));
    }
    let mut entries: Vec<DirEntry> = dirs
        .into_iter()
        .map(|name| DirEntry {
            name,
            kind: EntryKind::Directory,
        })
        .chain(files.into_iter().map(|name| DirEntry {
            name,
            kind: EntryKind::File,
        }))
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
