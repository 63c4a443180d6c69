//! Conversion configuration and the per-chapter pipeline.
//!
//! [`TojiruConfig`] ties the stages together: discovery, collection,
//! normalization, archive creation and validation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use tokio::fs;

use crate::collector::Collector;
use crate::discovery::discover;
use crate::error::{Error, Result};
use crate::generator::{create, validate};
use crate::normalizer::{ImageNormalizer, Passthrough, WebpToPng};
use crate::path_utils::{archive_path_for, normalize_extension, path_to_string_lossy};
use crate::types::{ChapterOutcome, ChapterUnit, ConversionReport, DEFAULT_EXTENSIONS};

/// The main Tojiru conversion configuration, built declaratively using the builder pattern.
///
/// A run discovers the chapters below [`input_path`](TojiruConfig::input_path)
/// and writes one `<chapter>.cbz` per chapter into
/// [`output_path`](TojiruConfig::output_path). Chapters are processed one after
/// another; a chapter that fails is recorded in the report and the run moves
/// on to the next one.
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use tojiru::prelude::*;
/// # #[tokio::main]
/// # async fn main() -> tojiru::error::Result<()> {
/// let config = TojiruConfig::builder()
///     .input_path(PathBuf::from("./manga/My Series"))
///     .output_path(PathBuf::from("./cbz"))
///     .recursive(true)
///     .build()?;
///
/// let report = config.convert().await?;
/// for (chapter, error) in report.failed() {
///     eprintln!("{chapter}: {error}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct TojiruConfig {
    /// Directory containing the chapter directories.
    #[builder(default)]
    pub input_path: PathBuf,

    /// Directory receiving the archives. When left empty, archives are written
    /// next to the chapter directories, into `input_path`.
    #[builder(default)]
    pub output_path: PathBuf,

    /// Whether chapters are the leaf directories of the whole tree (`true`) or
    /// the immediate subdirectories of `input_path` (`false`).
    ///
    /// In recursive mode chapter names contain the relative path, e.g.
    /// `Vol 1/Chapter 1`, which becomes `Vol 1-Chapter 1.cbz`.
    #[builder(default = "false")]
    pub recursive: bool,

    /// Whether existing archives may be replaced. When false, a chapter whose
    /// archive already exists fails with `AlreadyExists` and the file is left alone.
    #[builder(default = "false")]
    pub overwrite: bool,

    /// Extensions of files collected as pages, with or without leading dot, any case.
    #[builder(default = "DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()")]
    pub extensions: Vec<String>,

    /// Whether WebP pages are re-encoded as PNG before archiving.
    /// Ignored when a custom [`normalizer`](TojiruConfig::normalizer) is set.
    #[builder(default = "true")]
    pub convert_webp: bool,

    /// Whether every written archive is re-opened and fully read back.
    #[builder(default = "true")]
    pub validate_output: bool,

    /// Whether a missing output directory is created.
    #[builder(default = "true")]
    pub create_output_directory: bool,

    /// Custom image normalizer replacing the built-in WebP handling.
    #[builder(default)]
    pub normalizer: Option<Arc<dyn ImageNormalizer>>,
}

impl std::fmt::Debug for TojiruConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TojiruConfig")
            .field("input_path", &self.input_path)
            .field("output_path", &self.output_path)
            .field("recursive", &self.recursive)
            .field("overwrite", &self.overwrite)
            .field("extensions", &self.extensions)
            .field("convert_webp", &self.convert_webp)
            .field("validate_output", &self.validate_output)
            .field("create_output_directory", &self.create_output_directory)
            .field(
                "normalizer",
                if self.normalizer.is_some() {
                    &"Some(Normalizer)"
                } else {
                    &"None"
                },
            )
            .finish()
    }
}

impl TojiruConfig {
    /// Creates a new builder for configuring `TojiruConfig`.
    pub fn builder() -> TojiruConfigBuilder {
        TojiruConfigBuilder::default()
    }

    /// Directory the archives are written to.
    pub fn output_dir(&self) -> &Path {
        if self.output_path.as_os_str().is_empty() {
            &self.input_path
        } else {
            &self.output_path
        }
    }

    /// Performs validation checks on the configured paths without writing anything.
    ///
    /// [`convert`](TojiruConfig::convert) calls this automatically, so manual
    /// invocation is optional but useful for early error detection.
    ///
    /// # Returns
    ///
    /// * `Ok(&self)` - Configuration is valid
    /// * `Err(Error)` - The input is missing or not a directory, or the output
    ///   directory is unusable
    pub fn preflight_check(&self) -> Result<&Self> {
        if self.input_path.as_os_str().is_empty() {
            return Err(Error::Config("`input_path` must be set.".to_string()));
        }

        match std::fs::metadata(&self.input_path) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(Error::NotADirectory(self.input_path.clone())),
            Err(e) => return Err(Error::not_found(&self.input_path, e)),
        }

        let output_dir = self.output_dir();
        match std::fs::metadata(output_dir) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(Error::NotADirectory(output_dir.to_path_buf())),
            Err(_) if self.create_output_directory => {}
            Err(e) => return Err(Error::not_found(output_dir, e)),
        }

        Ok(self)
    }

    /// Runs the full pipeline: discovery, then collect, normalize, write and
    /// (optionally) validate for every chapter in natural order.
    ///
    /// # Returns
    ///
    /// * `Ok(ConversionReport)` - One outcome per discovered chapter. Chapter
    ///   failures are reported there and never abort the run.
    /// * `Err(Error)` - The preflight check or the discovery itself failed
    pub async fn convert(&self) -> Result<ConversionReport> {
        self.preflight_check()?;

        let output_dir = self.output_dir().to_path_buf();
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir)
                .await
                .map_err(|e| Error::write(&output_dir, e))?;
        }

        let chapters = discover(&self.input_path, self.recursive).await?;
        if chapters.is_empty() {
            warn!(
                "No chapters found in '{}'",
                path_to_string_lossy(&self.input_path)
            );
        }

        let collector = Collector::new(&self.extensions);
        let normalizer: Arc<dyn ImageNormalizer> = match &self.normalizer {
            Some(custom) => Arc::clone(custom),
            None if self.convert_webp => Arc::new(WebpToPng),
            None => Arc::new(Passthrough),
        };

        let mut report = ConversionReport::default();
        for chapter in chapters {
            let outcome = self
                .convert_chapter(&chapter, &collector, normalizer.as_ref(), &output_dir)
                .await;

            match &outcome {
                ChapterOutcome::Written {
                    chapter,
                    archive_path,
                    pages,
                } => info!(
                    "{}: wrote {} page(s) to '{}'",
                    chapter,
                    pages,
                    path_to_string_lossy(archive_path)
                ),
                ChapterOutcome::Skipped { chapter } => {
                    warn!("{}: no images found, skipping", chapter)
                }
                ChapterOutcome::Failed { chapter, error } => error!("{}: {}", chapter, error),
            }
            report.outcomes.push(outcome);
        }

        Ok(report)
    }

    async fn convert_chapter(
        &self,
        chapter: &ChapterUnit,
        collector: &Collector,
        normalizer: &dyn ImageNormalizer,
        output_dir: &Path,
    ) -> ChapterOutcome {
        match self
            .write_chapter(chapter, collector, normalizer, output_dir)
            .await
        {
            Ok(Some((archive_path, pages))) => ChapterOutcome::Written {
                chapter: chapter.name.clone(),
                archive_path,
                pages,
            },
            Ok(None) => ChapterOutcome::Skipped {
                chapter: chapter.name.clone(),
            },
            Err(error) => ChapterOutcome::Failed {
                chapter: chapter.name.clone(),
                error,
            },
        }
    }

    /// Returns the archive path and page count, or `None` when the chapter has no images.
    async fn write_chapter(
        &self,
        chapter: &ChapterUnit,
        collector: &Collector,
        normalizer: &dyn ImageNormalizer,
        output_dir: &Path,
    ) -> Result<Option<(PathBuf, usize)>> {
        let entries = collector.collect(&chapter.source_path).await?;
        if entries.is_empty() {
            return Ok(None);
        }

        let archive_path = archive_path_for(output_dir, &chapter.name);
        let normalized = normalizer.normalize(entries).await?;
        let pages = normalized.entries().len();

        let written = create(&archive_path, normalized.entries(), self.overwrite).await;
        if let Err(e) = normalized.release() {
            warn!("{}: failed to remove staging directory: {}", chapter.name, e);
        }
        written?;

        if self.validate_output {
            if let Err(e) = validate(&archive_path).await {
                if let Err(remove_error) = fs::remove_file(&archive_path).await {
                    warn!(
                        "Failed to remove invalid archive '{}': {}",
                        path_to_string_lossy(&archive_path),
                        remove_error
                    );
                }
                return Err(e);
            }
        }

        Ok(Some((archive_path, pages)))
    }
}

impl TojiruConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(extensions) = &self.extensions {
            if extensions.is_empty() {
                return Err("At least one image extension is required.".to_string());
            }
            for extension in extensions {
                let normalized = normalize_extension(extension);
                if normalized.is_empty() || normalized.contains(['/', '\\', '.']) {
                    return Err(format!("Invalid image extension: '{}'", extension));
                }
            }
        }

        Ok(())
    }
}
