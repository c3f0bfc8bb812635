//! Image preparation: compression on upload, crop/rotate on edit.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` decoders, EXIF orientation on the bitmap path |
//! | **Resample** | `image::imageops` Lanczos3 |
//! | **Rotate** | `imageops::rotate90/180/270`, `imageproc` bilinear warp otherwise |
//! | **Encode → WebP** | `webp` (libwebp), probed once per process |
//! | **Encode → JPEG** | `image::codecs::jpeg` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for scale and rotation geometry (unit testable)
//! - **Parameters**: Quality, prep options, crop rectangles
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **Format**: the memoized WebP/JPEG decision
//! - **Loader / Source**: the two decode paths and the object URLs they use
//! - **Transform**: resample, rotate, cut out
//! - **Operations**: [`Processor`] and the process-wide free functions

pub mod backend;
mod calculations;
pub mod file;
pub mod format;
pub mod loader;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod source;
pub mod transform;

pub use backend::{Dimensions, ImageError, RasterBackend};
pub use calculations::{fit_dimensions, fit_scale, rotated_bounds};
pub use file::{Blob, ImageFile, claim_unique_name, mime_for_name, strip_extension, to_file};
pub use format::{FormatDetector, OutputFormat};
pub use loader::{DecodePath, LoadedImage};
pub use operations::{
    Compression, Processor, compress, compress_batch, create_object_url, crop_image,
    default_processor, load_image, resolve_output_format, try_compress,
};
pub use params::{CropRect, DEFAULT_MAX_DIMENSION, PrepOptions, Quality};
pub use rust_backend::RustBackend;
pub use source::{ImageSource, ObjectUrl, ObjectUrlStore};
