//! Core data types and reports for the Tojiru conversion library.
//!
//! This module defines the fundamental data structures used throughout Tojiru:
//! - Pipeline units (`ChapterUnit`, `ImageEntry`)
//! - Per-chapter results (`ChapterOutcome`) and the run summary (`ConversionReport`)

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extensions collected when the caller does not provide an allow-list.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// One logical group of images that becomes exactly one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChapterUnit {
    /// Base identifier of the archive. In recursive discovery this is the path
    /// relative to the input root and may contain separators; sanitize it before
    /// using it as a filename.
    pub name: String,
    /// Absolute path of the chapter directory.
    pub source_path: PathBuf,
}

/// A single page to be stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageEntry {
    /// Absolute path to the content, possibly inside a staging directory.
    pub source_path: PathBuf,
    /// Flat name under which the content is stored (no directory separator).
    pub archive_name: String,
}

impl ImageEntry {
    pub fn new(source_path: impl Into<PathBuf>, archive_name: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            archive_name: archive_name.into(),
        }
    }
}

/// What happened to a single chapter during a conversion run.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ChapterOutcome {
    /// The archive was written (and validated, if enabled).
    Written {
        chapter: String,
        archive_path: PathBuf,
        pages: usize,
    },
    /// The chapter contained no qualifying images.
    Skipped { chapter: String },
    /// The chapter failed; sibling chapters were still processed.
    Failed {
        chapter: String,
        error: crate::error::Error,
    },
}

impl ChapterOutcome {
    pub fn chapter(&self) -> &str {
        match self {
            ChapterOutcome::Written { chapter, .. }
            | ChapterOutcome::Skipped { chapter }
            | ChapterOutcome::Failed { chapter, .. } => chapter,
        }
    }
}

/// Summary of a conversion run, one outcome per discovered chapter in chapter order.
#[derive(Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ConversionReport {
    pub outcomes: Vec<ChapterOutcome>,
}

impl ConversionReport {
    /// Paths of all archives written during the run.
    pub fn written(&self) -> Vec<&PathBuf> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ChapterOutcome::Written { archive_path, .. } => Some(archive_path),
                _ => None,
            })
            .collect()
    }

    /// Names of chapters skipped because they had no images.
    pub fn skipped(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ChapterOutcome::Skipped { chapter } => Some(chapter.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Failed chapters with their errors.
    pub fn failed(&self) -> Vec<(&str, &crate::error::Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ChapterOutcome::Failed { chapter, error } => Some((chapter.as_str(), error)),
                _ => None,
            })
            .collect()
    }

    /// True when no chapter failed. Skipped chapters do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failed().is_empty()
    }
}
