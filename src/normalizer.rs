//! Image normalization.
//!
//! Some page formats are poorly supported by comic readers. A normalizer
//! rewrites such entries into a supported format inside a temporary staging
//! directory and leaves every other entry untouched, keeping order and length.
//!
//! The staging directory belongs to the returned [`Normalized`] value. It is
//! removed by [`Normalized::release`] or, failing that, when the value is
//! dropped, so it never outlives the archive that needed it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::ImageFormat;
use log::debug;
use tempfile::TempDir;
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};
use crate::path_utils::extension_lowercase;
use crate::types::ImageEntry;

/// Prefix of staging directories created under the system temp directory.
const STAGING_PREFIX: &str = "tojiru-convert-";

/// Entries after normalization, plus the staging storage they may point into.
#[derive(Debug)]
pub struct Normalized {
    entries: Vec<ImageEntry>,
    staging: Option<TempDir>,
}

impl Normalized {
    /// Wraps entries that needed no conversion. No staging storage is held.
    pub fn passthrough(entries: Vec<ImageEntry>) -> Self {
        Self {
            entries,
            staging: None,
        }
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    /// Location of the staging directory, if any entry was converted.
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(|dir| dir.path())
    }

    /// Deletes the staging directory. Consumes `self`, so it runs at most once.
    pub fn release(self) -> Result<()> {
        match self.staging {
            Some(dir) => {
                let path = dir.path().to_path_buf();
                dir.close().map_err(|e| Error::write(&path, e))?;
                debug!("Released staging directory '{}'", path.display());
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Maps entries whose format is not archive-native to an equivalent supported format.
#[async_trait]
pub trait ImageNormalizer: Send + Sync {
    /// Returns an equal-length list in the same order. Only entries that needed
    /// conversion get a new `source_path` and `archive_name`; the stem of the
    /// name is preserved and only the extension changes.
    async fn normalize(&self, entries: Vec<ImageEntry>) -> Result<Normalized>;
}

/// Leaves every entry as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl ImageNormalizer for Passthrough {
    async fn normalize(&self, entries: Vec<ImageEntry>) -> Result<Normalized> {
        Ok(Normalized::passthrough(entries))
    }
}

/// Re-encodes WebP pages as PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpToPng;

impl WebpToPng {
    /// True for entries with a `.webp` extension, in any case.
    pub fn needs_conversion(entry: &ImageEntry) -> bool {
        extension_lowercase(Path::new(&entry.archive_name)).is_some_and(|ext| ext == "webp")
    }
}

#[async_trait]
impl ImageNormalizer for WebpToPng {
    async fn normalize(&self, entries: Vec<ImageEntry>) -> Result<Normalized> {
        if !entries.iter().any(Self::needs_conversion) {
            return Ok(Normalized::passthrough(entries));
        }

        // `a.webp` next to `a.png` or `a.WEBP` would end up as two `a.png` entries
        let mut names = HashSet::with_capacity(entries.len());
        for entry in &entries {
            let name = if Self::needs_conversion(entry) {
                png_name(&entry.archive_name)
            } else {
                entry.archive_name.clone()
            };
            if !names.insert(name.clone()) {
                return Err(Error::DuplicateEntry(name));
            }
        }

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()
            .map_err(|e| Error::write(std::env::temp_dir(), e))?;
        let staging_path = staging.path().to_path_buf();

        // On error `staging` is dropped on return, which removes any partial output.
        let entries = spawn_blocking(move || -> Result<Vec<ImageEntry>> {
            entries
                .into_iter()
                .map(|entry| {
                    if Self::needs_conversion(&entry) {
                        convert_to_png(&entry, &staging_path)
                    } else {
                        Ok(entry)
                    }
                })
                .collect()
        })
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        Ok(Normalized {
            entries,
            staging: Some(staging),
        })
    }
}

/// `cover.WebP` -> `cover.png`.
fn png_name(archive_name: &str) -> String {
    let stem = Path::new(archive_name)
        .file_stem()
        .map_or_else(|| archive_name.to_string(), |s| s.to_string_lossy().to_string());
    format!("{stem}.png")
}

fn convert_to_png(entry: &ImageEntry, staging_dir: &Path) -> Result<ImageEntry> {
    let decoded = image::open(&entry.source_path).map_err(|source| Error::Image {
        path: entry.source_path.clone(),
        source,
    })?;

    let archive_name = png_name(&entry.archive_name);
    let target: PathBuf = staging_dir.join(&archive_name);

    decoded
        .save_with_format(&target, ImageFormat::Png)
        .map_err(|source| Error::Image {
            path: target.clone(),
            source,
        })?;

    debug!(
        "Converted '{}' to '{}'",
        entry.source_path.display(),
        target.display()
    );

    Ok(ImageEntry::new(target, archive_name))
}
