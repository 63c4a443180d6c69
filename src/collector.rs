//! Page image collection.
//!
//! This module gathers the image files of one chapter directory, filtered by
//! an extension allow-list and ordered naturally by filename, so `10.jpg`
//! follows `9.jpg`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::debug;
use tokio::fs::{ReadDir, read_dir};

use crate::error::{Error, Result};
use crate::natural;
use crate::path_utils::{absolute, extension_lowercase, normalize_extension};
use crate::types::{DEFAULT_EXTENSIONS, ImageEntry};

/// Collects page images from chapter directories using a fixed extension allow-list.
#[derive(Debug, Clone)]
pub struct Collector {
    extensions: HashSet<String>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl Collector {
    /// Creates a new Collector for the given extensions.
    ///
    /// Extensions may be passed with or without a leading dot and in any case:
    /// `".JPG"`, `"jpg"` and `"Jpg"` are equivalent.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        }
    }

    /// Returns true if the file's extension is on the allow-list.
    pub fn accepts(&self, path: &Path) -> bool {
        extension_lowercase(path).is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Collects the qualifying files directly inside `directory`.
    ///
    /// Subdirectories are ignored. An empty result is not an error; deciding
    /// what to do with an empty chapter is up to the caller.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ImageEntry>)` - Entries in natural filename order
    /// * `Err(Error::NotFound)` - The directory could not be read
    pub async fn collect(&self, directory: &Path) -> Result<Vec<ImageEntry>> {
        let directory = absolute(directory)?;
        let mut paths: ReadDir = read_dir(&directory)
            .await
            .map_err(|e| Error::not_found(&directory, e))?;

        let mut images: Vec<(String, PathBuf)> = Vec::new();
        while let Some(entry) = paths
            .next_entry()
            .await
            .map_err(|e| Error::not_found(&directory, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::not_found(entry.path(), e))?;
            if file_type.is_dir() {
                continue;
            }

            if self.accepts(&entry.path()) {
                images.push((entry.file_name().to_string_lossy().to_string(), entry.path()));
            }
        }

        natural::sort_by_key(&mut images, |image| image.0.as_str());

        debug!(
            "Collected {} image(s) from '{}'",
            images.len(),
            directory.display()
        );

        Ok(images
            .into_iter()
            .map(|(name, path)| ImageEntry::new(path, name))
            .collect())
    }
}

/// Collects the images in `directory` whose extension is in `extensions`.
///
/// Shorthand for [`Collector::new`] followed by [`Collector::collect`].
pub async fn collect<I, S>(directory: impl AsRef<Path>, extensions: I) -> Result<Vec<ImageEntry>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Collector::new(extensions).collect(directory.as_ref()).await
}
