//! Tojiru - Image Folder to CBZ Binding Library
//!
//! This crate turns a directory tree of loose page images into one CBZ archive
//! per chapter. Pages keep their natural reading order (`2.jpg` before
//! `10.jpg`), and an archive is either written completely or not at all.
//!
//! # Getting Started
//!
//! Configure a run with [`TojiruConfig::builder`] and call
//! [`TojiruConfig::convert`]. Each chapter's result is reported separately;
//! one broken chapter never stops the others.
//!
//! ```rust,no_run
//! use tojiru::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> tojiru::error::Result<()> {
//!     let config = TojiruConfig::builder()
//!         .input_path(PathBuf::from("./my_manga/series_a"))
//!         .output_path(PathBuf::from("./converted"))
//!         .recursive(false)
//!         .overwrite(false)
//!         .build()?;
//!
//!     config.preflight_check()?;
//!
//!     let report = config.convert().await?;
//!     println!(
//!         "{} written, {} skipped, {} failed",
//!         report.written().len(),
//!         report.skipped().len(),
//!         report.failed().len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! The pipeline stages are usable on their own: [`discovery::discover`],
//! [`collector::collect`], the [`normalizer`] implementations and
//! [`generator::create`] / [`generator::validate`].

pub mod collector;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod natural;
pub mod normalizer;
pub mod path_utils;
pub mod tojiru;
pub mod types;

// Publicly expose the main `TojiruConfig` struct and its builder
pub use tojiru::TojiruConfig;
pub use tojiru::TojiruConfigBuilder;

// Re-export error and core types for direct access
pub use error::{Error, ErrorKind};
pub use types::{ChapterOutcome, ChapterUnit, ConversionReport, DEFAULT_EXTENSIONS, ImageEntry};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use tojiru::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        ChapterOutcome, ChapterUnit, ConversionReport, DEFAULT_EXTENSIONS, Error, ErrorKind,
        ImageEntry, TojiruConfig, TojiruConfigBuilder, error, generator, natural, types,
    };
    pub use crate::collector::Collector;
    pub use crate::discovery::discover;
    pub use crate::generator::Generator;
    pub use crate::normalizer::{ImageNormalizer, Normalized, Passthrough, WebpToPng};
    pub use std::cmp::Ordering;
    pub use std::path::{Path, PathBuf};
    pub use std::sync::Arc;
}
