//! Image sources addressed by URL string, and the object URL registry.
//!
//! The crop editor receives a display URL, not a file. Three kinds resolve
//! locally:
//!
//! | Source | Example | Resolution |
//! |---|---|---|
//! | Object URL | `blob:paintpile/000000000000002a` | [`ObjectUrlStore`] lookup |
//! | Data URL | `data:image/png;base64,iVBOR…` | base64 decode |
//! | File | `file:///photos/knight.jpg`, `photos/knight.jpg` | read from disk |
//!
//! Remote `http(s)` URLs are rejected: the pipeline has no network access.
//!
//! Object URLs are handed out as [`ObjectUrl`] guards. Dropping the guard
//! revokes the URL, so a load that fails halfway still releases it.

use super::backend::ImageError;
use super::file::ImageFile;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const OBJECT_URL_PREFIX: &str = "blob:paintpile/";

/// Registry of live object URLs and the payloads they point at.
#[derive(Debug, Default)]
pub struct ObjectUrlStore {
    next_id: AtomicU64,
    entries: Mutex<HashMap<String, Bytes>>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file`'s payload under a fresh URL.
    pub fn create(&self, file: &ImageFile) -> ObjectUrl<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{OBJECT_URL_PREFIX}{id:016x}");
        self.entries().insert(url.clone(), file.bytes.clone());
        ObjectUrl { store: self, url }
    }

    /// Payload behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.entries().get(url).cloned()
    }

    /// Release a URL. Returns false when it was not live.
    pub fn revoke(&self, url: &str) -> bool {
        self.entries().remove(url).is_some()
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Bytes>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A live object URL, revoked when dropped.
#[derive(Debug)]
pub struct ObjectUrl<'a> {
    store: &'a ObjectUrlStore,
    url: String,
}

impl ObjectUrl<'_> {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for ObjectUrl<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

impl Drop for ObjectUrl<'_> {
    fn drop(&mut self) {
        self.store.revoke(&self.url);
    }
}

/// A parsed image source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource<'a> {
    ObjectUrl(&'a str),
    DataUrl { mime: &'a str, payload: &'a str },
    Path(PathBuf),
}

impl<'a> ImageSource<'a> {
    pub fn parse(src: &'a str) -> Result<Self, ImageError> {
        if src.starts_with("blob:") {
            return Ok(ImageSource::ObjectUrl(src));
        }
        if let Some(rest) = src.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| ImageError::UnsupportedSource("malformed data URL".into()))?;
            let mime = header.strip_suffix(";base64").ok_or_else(|| {
                ImageError::UnsupportedSource("only base64 data URLs are supported".into())
            })?;
            return Ok(ImageSource::DataUrl { mime, payload });
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(ImageError::UnsupportedSource(format!(
                "remote URL {src} (no network access)"
            )));
        }
        let path = src.strip_prefix("file://").unwrap_or(src);
        if path.is_empty() {
            return Err(ImageError::UnsupportedSource("empty source".into()));
        }
        Ok(ImageSource::Path(PathBuf::from(path)))
    }

    /// Fetch the raw payload. Unreachable sources are load errors.
    pub fn fetch(&self, objects: &ObjectUrlStore) -> Result<Bytes, ImageError> {
        match self {
            ImageSource::ObjectUrl(url) => objects
                .resolve(url)
                .ok_or_else(|| ImageError::Load(format!("{url} is revoked or unknown"))),
            ImageSource::DataUrl { payload, .. } => general_purpose::STANDARD
                .decode(payload.trim())
                .map(Bytes::from)
                .map_err(|e| ImageError::Load(format!("invalid base64 payload: {e}"))),
            ImageSource::Path(path) => std::fs::read(path)
                .map(Bytes::from)
                .map_err(|e| ImageError::Load(format!("{}: {e}", path.display()))),
        }
    }
}
