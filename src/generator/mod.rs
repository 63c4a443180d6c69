//! Generator module provides the archive writing interface and the CBZ implementation.
//!
//! Besides the [`Generator`] trait this module exposes the three archive-level
//! operations used by the pipeline:
//!
//! - [`create`]: write an ordered list of entries into a new archive, all or nothing
//! - [`validate`]: check that an existing file is a readable archive
//! - [`entry_names`]: list stored entry names in archive order

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use async_trait::async_trait;
use log::info;
use tokio::task::spawn_blocking;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::types::ImageEntry;

pub mod cbz;

use cbz::Cbz;

/// Common interface for archive generators.
///
/// A generator owns its in-progress output exclusively. Nothing becomes
/// visible at the destination until [`Generator::save`] succeeds; dropping a
/// generator before that discards everything written so far.
#[async_trait]
pub trait Generator {
    /// Creates a new generator instance.
    ///
    /// # Parameters
    /// * `destination` - Final path of the archive
    /// * `overwrite` - Whether an existing file at `destination` may be replaced
    ///
    /// # Returns
    /// * `Result<Self>` - A new generator, or `Error::AlreadyExists` when the
    ///   destination exists and `overwrite` is false
    fn new(destination: &Path, overwrite: bool) -> Result<Self>
    where
        Self: Sized;

    /// Appends one entry. Entries are stored in the order they are added.
    ///
    /// An error discards the in-progress archive: every later `add_page` or
    /// `save` call fails and nothing is written to the destination.
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if failed
    async fn add_page(&mut self, entry: &ImageEntry) -> Result<&mut Self>
    where
        Self: Sized;

    /// Finalizes the archive and moves it into place at the destination.
    async fn save(self) -> Result<()>;
}

/// Writes `entries`, in order, into a new CBZ archive at `destination`.
///
/// Either the complete archive exists at `destination` afterwards or nothing
/// does. An empty entry list produces a valid archive with zero entries.
///
/// # Errors
///
/// * `Error::AlreadyExists` - `destination` exists and `overwrite` is false; nothing is written
/// * `Error::ReadFailure` - a source entry could not be opened or read
/// * `Error::WriteFailure` - the archive could not be written, finalized or moved into place
pub async fn create(
    destination: impl AsRef<Path>,
    entries: &[ImageEntry],
    overwrite: bool,
) -> Result<()> {
    let destination = destination.as_ref();
    let mut generator = Cbz::new(destination, overwrite)?;

    for entry in entries {
        generator.add_page(entry).await?;
    }
    generator.save().await?;

    info!(
        "Created '{}' with {} entr{}",
        destination.display(),
        entries.len(),
        if entries.len() == 1 { "y" } else { "ies" }
    );
    Ok(())
}

/// Opens `path` as a ZIP container and reads every entry to the end.
///
/// Fails on the first entry that cannot be opened or whose content does not
/// match its checksum, or if the file is not a ZIP container at all.
pub async fn validate(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref().to_path_buf();

    spawn_blocking(move || -> Result<()> {
        let mut archive = open_archive(&path)?;

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|source| Error::InvalidArchive {
                    path: path.clone(),
                    source,
                })?;
            io::copy(&mut entry, &mut io::sink()).map_err(|e| Error::read(&path, e))?;
        }
        Ok(())
    })
    .await
    .map_err(|e| Error::AsyncTaskError(e.to_string()))?
}

/// Returns the names of all entries stored in the archive at `path`, in stored order.
pub async fn entry_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref().to_path_buf();

    spawn_blocking(move || -> Result<Vec<String>> {
        let mut archive = open_archive(&path)?;
        let mut names = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|source| Error::InvalidArchive {
                    path: path.clone(),
                    source,
                })?;
            names.push(entry.name().to_string());
        }
        Ok(names)
    })
    .await
    .map_err(|e| Error::AsyncTaskError(e.to_string()))?
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|e| Error::not_found(path, e))?;
    ZipArchive::new(BufReader::new(file)).map_err(|source| Error::InvalidArchive {
        path: path.to_path_buf(),
        source,
    })
}
