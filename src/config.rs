//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `paintpile.toml`. Stock defaults
//! are the base layer; a user file only lists the values it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [compress]
//! max_dimension = 1600   # Longer edge cap for uploaded photos (px)
//! quality = 0.8          # Lossy quality, 0 < q <= 1
//!
//! [crop]
//! max_dimension = 1600   # Longer edge cap for crop output (px)
//! quality = 0.8
//!
//! [upload]
//! allowed_types = ["image/jpeg", "image/png", "image/gif", "image/webp"]
//! max_file_size = 10485760   # Bytes per file (10 MiB)
//! max_files = 5              # Attachments per progress log
//! ```
//!
//! ## Partial Configuration
//!
//! ```toml
//! # Only make crops smaller
//! [crop]
//! max_dimension = 1200
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{DEFAULT_MAX_DIMENSION, PrepOptions, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "paintpile.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `paintpile.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Automatic compression of every selected photo.
    pub compress: PrepConfig,
    /// Output of the crop editor.
    pub crop: PrepConfig,
    /// What the photo picker accepts.
    pub upload: UploadConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.compress.validate("compress")?;
        self.crop.validate("crop")?;
        self.upload.validate()
    }
}

/// Size and quality bounds for one preparation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrepConfig {
    /// Longer edge cap in pixels. Smaller images are never enlarged.
    pub max_dimension: u32,
    /// Lossy encoder quality in `(0, 1]`.
    pub quality: f32,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: Quality::default().value(),
        }
    }
}

impl PrepConfig {
    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ConfigError::Validation(format!(
                "{section}.quality must be greater than 0 and at most 1"
            )));
        }
        if self.max_dimension == 0 {
            return Err(ConfigError::Validation(format!(
                "{section}.max_dimension must be non-zero"
            )));
        }
        Ok(())
    }

    pub fn options(&self) -> PrepOptions {
        PrepOptions {
            max_dimension: self.max_dimension,
            quality: Quality::new(self.quality),
        }
    }
}

/// Photo picker limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Accepted MIME types.
    pub allowed_types: Vec<String>,
    /// Largest accepted payload in bytes.
    pub max_file_size: u64,
    /// Attachments allowed on one progress log.
    pub max_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_types: ["image/jpeg", "image/png", "image/gif", "image/webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_file_size: 10 * 1024 * 1024,
            max_files: 5,
        }
    }
}

impl UploadConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_types.is_empty() {
            return Err(ConfigError::Validation(
                "upload.allowed_types must not be empty".into(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "upload.max_file_size must be non-zero".into(),
            ));
        }
        if self.max_files == 0 {
            return Err(ConfigError::Validation(
                "upload.max_files must be non-zero".into(),
            ));
        }
        Ok(())
    }

    pub fn allows_type(&self, mime: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock defaults as a `toml::Value::Table`, the base layer
/// user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::from_str(stock_config_toml())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `paintpile.toml` in the given directory, falling back to
/// stock defaults when there is none.
pub fn load_config(dir: &Path) -> Result<Config, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(stock_defaults_value()?, overlay)
}

/// Load config from an explicitly named file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// Returns a fully-commented stock `paintpile.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Paintpile Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Automatic compression
# ---------------------------------------------------------------------------
# Every selected photo is resized so its longer edge fits max_dimension and
# re-encoded as WebP (JPEG where WebP encoding is unavailable). Photos that
# already fit and are already in that format are kept as they are.
[compress]
# Longer edge cap in pixels. Smaller photos are never enlarged.
max_dimension = 1600

# Lossy quality, greater than 0 and at most 1.
quality = 0.8

# ---------------------------------------------------------------------------
# Crop editor output
# ---------------------------------------------------------------------------
[crop]
max_dimension = 1600
quality = 0.8

# ---------------------------------------------------------------------------
# Photo picker
# ---------------------------------------------------------------------------
[upload]
# MIME types accepted for attachment.
allowed_types = ["image/jpeg", "image/png", "image/gif", "image/webp"]

# Largest accepted file in bytes (10 MiB).
max_file_size = 10485760

# Attachments allowed on one progress log.
max_files = 5
"##
}
