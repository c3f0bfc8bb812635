//! Photo selection rules applied before anything is compressed.
//!
//! A progress log carries a bounded number of attachments. When the user
//! picks more files, only as many as fit in the remaining slots are looked
//! at; the rest are dropped without comment. Each examined file must have an
//! allowed type and stay under the size cap. Rejections are collected per
//! file and the first one is what the user gets to see.

use crate::config::UploadConfig;
use crate::imaging::ImageFile;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("{name}: unsupported format {mime:?} (allowed: {allowed})")]
    UnsupportedType {
        name: String,
        mime: String,
        allowed: String,
    },
    #[error("{name}: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },
    #[error("at most {max_files} photos can be attached")]
    LimitReached { max_files: usize },
}

/// Outcome of adding picked files to an existing attachment list.
#[derive(Debug, Default)]
pub struct Selection {
    /// Files that passed validation, in pick order.
    pub accepted: Vec<ImageFile>,
    /// One entry per rejected file, or a single `LimitReached`.
    pub errors: Vec<SelectionError>,
    /// Files past the remaining slots, never examined.
    pub ignored: usize,
}

impl Selection {
    /// The error shown to the user, if any.
    pub fn headline(&self) -> Option<&SelectionError> {
        self.errors.first()
    }

    /// `existing` followed by the accepted files.
    pub fn merged_with(self, existing: &[ImageFile]) -> Vec<ImageFile> {
        existing.iter().cloned().chain(self.accepted).collect()
    }
}

/// Check one file against the type and size rules.
pub fn validate_file(file: &ImageFile, config: &UploadConfig) -> Result<(), SelectionError> {
    if !config.allows_type(&file.mime) {
        return Err(SelectionError::UnsupportedType {
            name: file.name.clone(),
            mime: file.mime.clone(),
            allowed: config.allowed_types.join(", "),
        });
    }
    let size = file.size() as u64;
    if size > config.max_file_size {
        return Err(SelectionError::TooLarge {
            name: file.name.clone(),
            size,
            limit: config.max_file_size,
        });
    }
    Ok(())
}

/// Validate `incoming` against the slots left after `existing`.
pub fn select(
    existing: &[ImageFile],
    incoming: Vec<ImageFile>,
    config: &UploadConfig,
) -> Selection {
    let remaining = config.max_files.saturating_sub(existing.len());
    if remaining == 0 {
        log::debug!("Selection rejected: {} of {} slots used", existing.len(), config.max_files);
        return Selection {
            ignored: incoming.len(),
            errors: vec![SelectionError::LimitReached {
                max_files: config.max_files,
            }],
            ..Selection::default()
        };
    }

    let ignored = incoming.len().saturating_sub(remaining);
    let mut selection = Selection {
        ignored,
        ..Selection::default()
    };
    for file in incoming.into_iter().take(remaining) {
        match validate_file(&file, config) {
            Ok(()) => selection.accepted.push(file),
            Err(e) => selection.errors.push(e),
        }
    }
    selection
}
