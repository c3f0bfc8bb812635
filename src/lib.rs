//! # Paintpile
//!
//! Image preparation for a miniature-painting backlog tracker. Every photo
//! attached to a progress log is compressed before it is uploaded, and may be
//! cropped, rotated and zoomed in an editor before it replaces the pending
//! upload.
//!
//! # Architecture: Two Entry Points
//!
//! ```text
//! 1. Select    picked files  →  upload::select     (type, size, slot limits)
//! 2. Compress  ImageFile     →  imaging::compress  (resize + re-encode, never fails)
//! 3. Edit      display URL   →  imaging::crop_image (rotate, crop, encode, fails loud)
//! ```
//!
//! Compression runs on every photo right after selection. Editing is
//! optional and works on the display URL of the (possibly already
//! compressed) file, so the editor sees exactly what would be uploaded.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Format probe, decoding, compression and the crop transform |
//! | [`upload`] | Selection rules applied before compression |
//! | [`editor`] | Crop editor session state and its apply step |
//! | [`config`] | `paintpile.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting for compress and crop runs |
//!
//! # Design Decisions
//!
//! ## One Output Format Per Process
//!
//! All prepared photos share one lossy format: WebP when the encoder is
//! present, JPEG otherwise. The decision is made once, by asking the backend
//! to serialize a single pixel as WebP and checking what came back, and
//! cached for the life of the process. See [`imaging::FormatDetector`].
//!
//! ## Two Error Policies
//!
//! A failed compression must never block an upload, so
//! [`imaging::compress`] returns the original file on any error and logs a
//! warning. A failed crop is something the user needs to hear about, so
//! [`imaging::crop_image`] returns a `Result`. The fail-loud form of
//! compression is available as [`imaging::try_compress`].
//!
//! ## The Backend Seam
//!
//! Decoding, encoding and the capability probe sit behind the
//! [`imaging::RasterBackend`] trait. Geometry and resampling do not: they are
//! plain functions, so crop output is identical on every backend. Tests run
//! the whole pipeline against a recording mock.
//!
//! ## Orientation
//!
//! The fast decode path applies EXIF orientation and the fallback path does
//! not. Crop always loads the way the fallback does, because the editor
//! measures its rectangle against the image as displayed from its URL.

pub mod config;
pub mod editor;
pub mod imaging;
pub mod output;
pub mod upload;
