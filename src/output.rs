//! CLI output formatting.
//!
//! # Entity Display Contract
//!
//! Every input file gets the same two-level shape:
//!
//! 1. **Header line**: positional index + file name (+ `→ output name` when a
//!    new file was produced)
//! 2. **Context line**: indented size change, or why the file was kept or
//!    rejected
//!
//! ## Compress
//!
//! ```text
//! Output format: image/webp
//! 001 IMG_0042.jpg → IMG_0042.webp
//!     2.4 MB → 301.5 KB (-88%)
//! 002 primed.webp
//!     kept (118.0 KB)
//! 003 scan.tiff
//!     rejected: scan.tiff: unsupported format "image/tiff" (allowed: …)
//!
//! Compressed 1, kept 1, rejected 1
//! ```
//!
//! ## Crop
//!
//! ```text
//! knight.png → cropped.webp
//!     600x800 at (0, 0), rotated 90°
//!     Saved: out/cropped.webp (84.2 KB)
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. The same report types
//! serialize to JSON for `--json`.

use crate::imaging::{CropRect, OutputFormat};
use serde::Serialize;
use std::path::PathBuf;

// ============================================================================
// Report types
// ============================================================================

/// What happened to one input of a `compress` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    /// A new, re-encoded file was written.
    Compressed { output: PathBuf, output_bytes: u64 },
    /// The original payload was written unchanged (already fit, or the
    /// encoder fell back).
    Kept { output: PathBuf },
    /// Failed selection rules; nothing was written.
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressEntry {
    pub source: PathBuf,
    pub original_bytes: u64,
    #[serde(flatten)]
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressReport {
    pub format: OutputFormat,
    pub entries: Vec<CompressEntry>,
}

impl CompressReport {
    /// `(compressed, kept, rejected)` counts.
    pub fn tally(&self) -> (usize, usize, usize) {
        self.entries
            .iter()
            .fold((0, 0, 0), |(c, k, r), entry| match entry.status {
                EntryStatus::Compressed { .. } => (c + 1, k, r),
                EntryStatus::Kept { .. } => (c, k + 1, r),
                EntryStatus::Rejected { .. } => (c, k, r + 1),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub rect: CropRect,
    pub rotation: f64,
    pub output_bytes: u64,
}

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Last path component, or the whole path when there is none.
fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte count with one decimal.
///
/// ```text
/// 512 B
/// 118.0 KB
/// 2.4 MB
/// ```
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Signed percentage change from `before` to `after`, rounded.
fn format_change(before: u64, after: u64) -> String {
    if before == 0 {
        return "n/a".to_string();
    }
    let pct = ((after as f64 - before as f64) / before as f64 * 100.0).round() as i64;
    if pct > 0 {
        format!("+{}%", pct)
    } else {
        format!("{}%", pct)
    }
}

// ============================================================================
// Compress output
// ============================================================================

/// Format the result of a `compress` run.
pub fn format_compress_report(report: &CompressReport) -> Vec<String> {
    let mut lines = vec![format!("Output format: {}", report.format)];

    for (i, entry) in report.entries.iter().enumerate() {
        let index = format_index(i + 1);
        let name = display_name(&entry.source);
        match &entry.status {
            EntryStatus::Compressed {
                output,
                output_bytes,
            } => {
                lines.push(format!("{} {} → {}", index, name, display_name(output)));
                lines.push(format!(
                    "{}{} → {} ({})",
                    indent(1),
                    format_bytes(entry.original_bytes),
                    format_bytes(*output_bytes),
                    format_change(entry.original_bytes, *output_bytes)
                ));
            }
            EntryStatus::Kept { .. } => {
                lines.push(format!("{} {}", index, name));
                lines.push(format!(
                    "{}kept ({})",
                    indent(1),
                    format_bytes(entry.original_bytes)
                ));
            }
            EntryStatus::Rejected { reason } => {
                lines.push(format!("{} {}", index, name));
                lines.push(format!("{}rejected: {}", indent(1), reason));
            }
        }
    }

    let (compressed, kept, rejected) = report.tally();
    lines.push(String::new());
    lines.push(format!(
        "Compressed {}, kept {}, rejected {}",
        compressed, kept, rejected
    ));
    lines
}

/// Print compress output to stdout.
pub fn print_compress_report(report: &CompressReport) {
    for line in format_compress_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Crop output
// ============================================================================

/// Format the result of a `crop` run.
pub fn format_crop_report(report: &CropReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} → {}",
        display_name(&report.source),
        display_name(&report.output)
    )];
    let mut geometry = format!(
        "{}{}x{} at ({}, {})",
        indent(1),
        report.rect.width,
        report.rect.height,
        report.rect.x,
        report.rect.y
    );
    if report.rotation != 0.0 {
        geometry.push_str(&format!(", rotated {}°", report.rotation));
    }
    lines.push(geometry);
    lines.push(format!(
        "{}Saved: {} ({})",
        indent(1),
        report.output.display(),
        format_bytes(report.output_bytes)
    ));
    lines
}

/// Print crop output to stdout.
pub fn print_crop_report(report: &CropReport) {
    for line in format_crop_report(report) {
        println!("{}", line);
    }
}
