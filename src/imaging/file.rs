//! In-memory file values passed in and out of the pipeline.
//!
//! An [`ImageFile`] is what a file picker hands over: a name, a declared MIME
//! type and the payload. A [`Blob`] is what an encoder produces: payload and
//! type, no name. [`to_file`] turns one into the other.
//!
//! Payloads are [`Bytes`], so cloning a file shares its buffer. Returning
//! "the same file" is observable with [`ImageFile::shares_payload`].

use bytes::Bytes;
use std::collections::HashSet;
use std::path::Path;

/// A named, typed binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    /// Declared MIME type. Empty when the type is unknown.
    pub mime: String,
    pub bytes: Bytes,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, declaring its type from the extension.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_for_name(&name).unwrap_or_default();
        Ok(Self::new(name, mime, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// File name without its last extension.
    pub fn stem(&self) -> &str {
        strip_extension(&self.name)
    }

    /// True when both files point at the very same payload buffer.
    pub fn shares_payload(&self, other: &ImageFile) -> bool {
        self.bytes.as_ptr() == other.bytes.as_ptr() && self.bytes.len() == other.bytes.len()
    }
}

/// Encoder output: a payload and the MIME type it was encoded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Bytes,
    pub mime: String,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }
}

/// Wrap a blob into a named file. The type defaults to the blob's own.
pub fn to_file(blob: Blob, name: impl Into<String>, mime: Option<&str>) -> ImageFile {
    let mime = match mime {
        Some(explicit) if !explicit.is_empty() => explicit.to_string(),
        _ => blob.mime,
    };
    ImageFile {
        name: name.into(),
        mime,
        bytes: blob.bytes,
    }
}

/// Drop the last `.ext` from a file name.
///
/// - `"photo.png"` → `"photo"`
/// - `"base.coat.jpeg"` → `"base.coat"`
/// - `"README"` → `"README"`
/// - `"trailing."` → `"trailing."` (nothing after the dot)
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() => &name[..dot],
        _ => name,
    }
}

/// Claim `name` in `taken`, or the first free `stem-N.ext` (N from 2) when
/// it is already claimed.
///
/// - `"wip.webp"`, then `"wip.webp"` again → `"wip.webp"`, `"wip-2.webp"`
/// - `"README"` twice → `"README"`, `"README-2"`
pub fn claim_unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let stem = strip_extension(name);
    let ext = &name[stem.len()..];
    (2u32..)
        .map(|n| format!("{stem}-{n}{ext}"))
        .find(|candidate| taken.insert(candidate.clone()))
        .unwrap_or_else(|| name.to_string())
}

/// MIME type implied by a file name's extension, for the raster types the
/// uploader deals with.
pub fn mime_for_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_unique_name_suffixes_repeats() {
        let mut taken = HashSet::new();
        assert_eq!(claim_unique_name("wip.webp", &mut taken), "wip.webp");
        assert_eq!(claim_unique_name("wip.webp", &mut taken), "wip-2.webp");
        assert_eq!(claim_unique_name("wip.webp", &mut taken), "wip-3.webp");
        assert_eq!(claim_unique_name("base.coat.jpg", &mut taken), "base.coat.jpg");
        assert_eq!(claim_unique_name("base.coat.jpg", &mut taken), "base.coat-2.jpg");
    }

    #[test]
    fn claim_unique_name_skips_names_already_taken() {
        let mut taken: HashSet<String> = ["wip.webp", "wip-2.webp"].map(String::from).into();
        assert_eq!(claim_unique_name("wip.webp", &mut taken), "wip-3.webp");
        assert_eq!(claim_unique_name("README", &mut taken), "README");
        assert_eq!(claim_unique_name("README", &mut taken), "README-2");
    }

    #[test]
    fn strip_extension_variants() {
        assert_eq!(strip_extension("photo.png"), "photo");
        assert_eq!(strip_extension("base.coat.jpeg"), "base.coat");
        assert_eq!(strip_extension("README"), "README");
        assert_eq!(strip_extension("trailing."), "trailing.");
        assert_eq!(strip_extension(".hidden"), "");
    }

    #[test]
    fn to_file_defaults_to_blob_type() {
        let file = to_file(Blob::new(vec![1, 2, 3], "image/webp"), "photo.webp", None);
        assert_eq!(file.name, "photo.webp");
        assert_eq!(file.mime, "image/webp");
        assert_eq!(file.size(), 3);
    }

    #[test]
    fn to_file_explicit_type_wins() {
        let file = to_file(
            Blob::new(vec![1], "application/octet-stream"),
            "cropped.jpg",
            Some("image/jpeg"),
        );
        assert_eq!(file.mime, "image/jpeg");
    }

    #[test]
    fn to_file_keeps_payload_buffer() {
        let blob = Blob::new(Bytes::from_static(b"payload"), "image/jpeg");
        let ptr = blob.bytes.as_ptr();
        let file = to_file(blob, "a.jpg", None);
        assert_eq!(file.bytes.as_ptr(), ptr);
    }

    #[test]
    fn shares_payload_tracks_clones_not_content() {
        let original = ImageFile::new("a.jpg", "image/jpeg", vec![9u8; 16]);
        let clone = original.clone();
        let copy = ImageFile::new("a.jpg", "image/jpeg", vec![9u8; 16]);

        assert!(original.shares_payload(&clone));
        assert!(!original.shares_payload(&copy));
        assert_eq!(original, copy);
    }

    #[test]
    fn mime_for_name_known_types() {
        assert_eq!(mime_for_name("a.JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_name("a.jpeg"), Some("image/jpeg"));
        assert_eq!(mime_for_name("a.png"), Some("image/png"));
        assert_eq!(mime_for_name("a.gif"), Some("image/gif"));
        assert_eq!(mime_for_name("a.webp"), Some("image/webp"));
        assert_eq!(mime_for_name("a.heic"), None);
        assert_eq!(mime_for_name("noext"), None);
    }

    #[test]
    fn read_declares_type_from_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("wip-knight.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let file = ImageFile::read(&path).unwrap();
        assert_eq!(file.name, "wip-knight.png");
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.stem(), "wip-knight");
    }
}
