use std::borrow::Cow;
use std::io;
use std::marker::PhantomData;

use async_trait::async_trait;
use bytes::Bytes;
use rust_embed::RustEmbed;

use crate::store::{checked, implicit_dir_entries, is_implicit_dir, DirEntry, FileStore, Metadata};

/// Store over files compiled into the binary with `rust-embed`.
///
/// The embedded folder is expected to contain the frontend project directory
/// (for example `frontend/`), not its contents.
pub struct EmbeddedStore<E> {
    _assets: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> EmbeddedStore<E> {
    pub fn new() -> Self {
        Self {
            _assets: PhantomData,
        }
    }
}

impl<E: RustEmbed> Default for EmbeddedStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn cow_bytes(data: Cow<'static, [u8]>) -> Bytes {
    match data {
        Cow::Borrowed(slice) => Bytes::from_static(slice),
        Cow::Owned(vec) => Bytes::from(vec),
    }
}

#[async_trait]
impl<E: RustEmbed + 'static> FileStore for EmbeddedStore<E> {
    async fn metadata(&self, path: &str) -> io::Result<Metadata> {
        let path = checked(path)?;
        if let Some(file) = E::get(path) {
            return Ok(Metadata::file(file.data.len() as u64));
        }
        if is_implicit_dir(E::iter(), path) {
            return Ok(Metadata::directory());
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("'{path}' is not embedded"),
        ))
    }

    async fn read(&self, path: &str) -> io::Result<Bytes> {
        let path = checked(path)?;
        E::get(path).map(|file| cow_bytes(file.data)).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{path}' is not an embedded file"),
            )
        })
    }

    async fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let path = checked(path)?;
        implicit_dir_entries(E::iter(), path)
    }

    fn is_bundled(&self) -> bool {
        true
    }
}
