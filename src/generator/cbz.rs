use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::prelude::*;
use log::{debug, warn};
use tempfile::NamedTempFile;
use tokio::task::spawn_blocking;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::path_utils::path_to_string_lossy;
use crate::types::ImageEntry;

/// Copy buffer size for streaming entries into the archive.
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Entries at or above this size need ZIP64 headers.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// A generator for creating CBZ (Comic Book ZIP) files.
///
/// Pages are stored uncompressed at the archive root, in the order they are
/// added, with their source modification times. Output goes to a hidden
/// temporary file next to the destination which is renamed into place by
/// [`Generator::save`]; if the generator is dropped before that, the
/// temporary file is deleted and the destination is never touched.
#[derive(Debug)]
pub struct Cbz {
    zip: Option<ZipWriter<NamedTempFile>>,
    destination: PathBuf,
    overwrite: bool,
    page_count: usize,
}

impl Cbz {
    /// Number of pages added so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Final location of the archive.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Fails once a page has failed; the generator never resumes after that.
    fn take_zip(&mut self) -> Result<ZipWriter<NamedTempFile>> {
        self.zip.take().ok_or_else(|| {
            Error::Other(format!(
                "Archive for '{}' was discarded after a failed page",
                path_to_string_lossy(&self.destination)
            ))
        })
    }
}

#[async_trait]
impl Generator for Cbz {
    fn new(destination: &Path, overwrite: bool) -> Result<Self> {
        if !overwrite && destination.exists() {
            return Err(Error::AlreadyExists(destination.to_path_buf()));
        }

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let file = tempfile::Builder::new()
            .prefix(".tojiru-")
            .suffix(".cbz.part")
            .tempfile_in(parent)
            .map_err(|e| Error::write(destination, e))?;

        debug!(
            "Staging '{}' in '{}'",
            path_to_string_lossy(destination),
            path_to_string_lossy(file.path())
        );

        Ok(Cbz {
            zip: Some(ZipWriter::new(file)),
            destination: destination.to_path_buf(),
            overwrite,
            page_count: 0,
        })
    }

    async fn add_page(&mut self, entry: &ImageEntry) -> Result<&mut Self> {
        let mut zip = self.take_zip()?;
        let entry_clone = entry.clone();
        let destination = self.destination.clone();

        // The writer travels into the blocking task and comes back with the result.
        // If the task panics, the writer is dropped there and the staged file with it.
        let (zip, result) = spawn_blocking(move || {
            let result = write_entry(&mut zip, &entry_clone, &destination);
            (zip, result)
        })
        .await
        .map_err(|e| Error::AsyncTaskError(e.to_string()))?;

        match result {
            Ok(()) => {
                self.zip = Some(zip);
                self.page_count += 1;
                Ok(self)
            }
            Err(e) => {
                // A failed page may have left a partial entry behind; the archive is unusable.
                warn!(
                    "Discarding archive for '{}' after failed page '{}'",
                    path_to_string_lossy(&self.destination),
                    entry.archive_name
                );
                drop(zip);
                Err(e)
            }
        }
    }

    async fn save(mut self) -> Result<()> {
        let zip = self.take_zip()?;
        let destination = self.destination.clone();
        let overwrite = self.overwrite;

        spawn_blocking(move || finalize(zip, &destination, overwrite))
            .await
            .map_err(|e| Error::AsyncTaskError(e.to_string()))??;

        Ok(())
    }
}

impl Drop for Cbz {
    fn drop(&mut self) {
        if self.zip.is_some() {
            warn!(
                "Discarding unfinished archive for '{}' after {} page(s)",
                path_to_string_lossy(&self.destination),
                self.page_count
            );
        }
    }
}

/// Streams one source file into the archive as a stored entry.
fn write_entry(
    zip: &mut ZipWriter<NamedTempFile>,
    entry: &ImageEntry,
    destination: &Path,
) -> Result<()> {
    if entry.archive_name.is_empty() || entry.archive_name.contains(['/', '\\']) {
        return Err(Error::write(
            destination,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("entry name '{}' is not a flat file name", entry.archive_name),
            ),
        ));
    }

    let mut source =
        File::open(&entry.source_path).map_err(|e| Error::read(&entry.source_path, e))?;
    let metadata = source
        .metadata()
        .map_err(|e| Error::read(&entry.source_path, e))?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip_timestamp(metadata.modified().ok()))
        .unix_permissions(0o644)
        .large_file(metadata.len() >= ZIP64_THRESHOLD);

    zip.start_file(entry.archive_name.as_str(), options)
        .map_err(|e| Error::write(destination, io::Error::other(e)))?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::read(&entry.source_path, e)),
        };
        zip.write_all(&buffer[..read])
            .map_err(|e| Error::write(destination, e))?;
    }

    debug!(
        "Stored '{}' ({} bytes)",
        entry.archive_name,
        metadata.len()
    );
    Ok(())
}

/// Writes the central directory, flushes to disk and renames the staged file onto `destination`.
fn finalize(zip: ZipWriter<NamedTempFile>, destination: &Path, overwrite: bool) -> Result<()> {
    let staged = zip
        .finish()
        .map_err(|e| Error::write(destination, io::Error::other(e)))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| Error::write(destination, e))?;

    let persisted = if overwrite {
        staged.persist(destination)
    } else {
        staged.persist_noclobber(destination)
    };

    // On failure the PersistError still owns the staged file and deletes it when dropped.
    persisted.map(|_| ()).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            Error::AlreadyExists(destination.to_path_buf())
        } else {
            Error::write(destination, e.error)
        }
    })
}

/// Converts a file modification time into a ZIP (MS-DOS, local time) timestamp.
/// Times outside the representable 1980..=2107 range fall back to 1980-01-01.
fn zip_timestamp(modified: Option<SystemTime>) -> zip::DateTime {
    modified
        .map(DateTime::<Local>::from)
        .and_then(|t| {
            zip::DateTime::from_date_and_time(
                u16::try_from(t.year()).ok()?,
                t.month() as u8,
                t.day() as u8,
                t.hour() as u8,
                t.minute() as u8,
                t.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}
