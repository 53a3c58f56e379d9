use std::io;

use async_trait::async_trait;
use bytes::Bytes;

use crate::store::{join_path, DirEntry, DynStore, FileStore, Metadata};

pub const INDEX_FILE: &str = "index.html";

/// Store wrapper that hides directories without an `index.html`.
///
/// Opening such a directory fails with the error from the index lookup, so
/// callers see a plain not-found instead of something they could list.
#[derive(Clone)]
pub struct GuardedStore {
    inner: DynStore,
}

impl GuardedStore {
    pub fn new(inner: DynStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl FileStore for GuardedStore {
    async fn metadata(&self, path: &str) -> io::Result<Metadata> {
        let meta = self.inner.metadata(path).await?;
        if meta.is_dir() {
            let index = join_path(path, INDEX_FILE);
            self.inner.metadata(&index).await?;
        }
        Ok(meta)
    }

    async fn read(&self, path: &str) -> io::Result<Bytes> {
        self.inner.read(path).await
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        self.inner.read_dir(path).await
    }

    fn is_bundled(&self) -> bool {
        self.inner.is_bundled()
    }
}
