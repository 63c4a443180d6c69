//! Path utilities for safe and robust file path handling.
//!
//! Helpers for hidden-entry detection, case-folded extension matching and
//! turning chapter names into flat archive filenames.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Names starting with this character are hidden and never become chapters.
pub const HIDDEN_MARKER: char = '.';

/// File extension used for generated archives.
pub const ARCHIVE_EXTENSION: &str = "cbz";

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Checks if a file or directory name starts with the hidden marker.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER)
}

/// Normalizes an extension for comparison: strips one leading dot and lower-cases.
pub fn normalize_extension(extension: &str) -> String {
    extension
        .strip_prefix('.')
        .unwrap_or(extension)
        .to_lowercase()
}

/// Returns the lower-cased extension of a path, without the dot.
pub fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Sanitizes a filename by replacing invalid characters with safe alternatives.
///
/// Path separators are replaced as well, so a nested chapter name such as
/// `Vol 1/Chapter 1` becomes the flat `Vol 1-Chapter 1`.
///
/// # Arguments
///
/// * `filename` - The filename to sanitize
///
/// # Returns
///
/// * `String` - The sanitized filename
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | '"' | '|' | '?' | '*' => '-',
            ':' => '-',
            '/' | '\\' => '-',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Builds `<output_dir>/<sanitized chapter name>.cbz`.
pub fn archive_path_for(output_dir: &Path, chapter_name: &str) -> PathBuf {
    output_dir.join(format!(
        "{}.{}",
        sanitize_filename(chapter_name),
        ARCHIVE_EXTENSION
    ))
}

/// Resolves `path` against the current directory without touching the file system.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| {
        Error::Config(format!(
            "Cannot resolve '{}' to an absolute path: {}",
            path_to_string_lossy(path),
            e
        ))
    })
}
