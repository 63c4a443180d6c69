//! Chapter discovery.
//!
//! Turns an input directory into an ordered list of [`ChapterUnit`]s. In flat
//! mode every visible subdirectory of the root is a chapter. In recursive mode
//! the tree is walked with an explicit worklist and every visible leaf
//! directory (one without visible subdirectories) is a chapter, named by its
//! path relative to the root.
//!
//! Hidden directories are pruned together with everything below them.
//! Symbolic links are not followed.

use std::path::{Path, PathBuf};

use log::debug;
use tokio::fs::{self, ReadDir};

use crate::error::{Error, Result};
use crate::natural;
use crate::path_utils::{absolute, is_hidden_name};
use crate::types::ChapterUnit;

/// Discovers the chapters below `input_root`, sorted naturally by name.
///
/// # Arguments
///
/// * `input_root` - Directory to scan
/// * `recursive` - When true, chapters are the leaf directories of the whole tree;
///   otherwise the immediate subdirectories of `input_root`
///
/// # Returns
///
/// * `Ok(Vec<ChapterUnit>)` - Possibly empty list of chapters
/// * `Err(Error::NotFound)` - The root does not exist or a directory could not be listed
/// * `Err(Error::NotADirectory)` - The root is not a directory
pub async fn discover(input_root: impl AsRef<Path>, recursive: bool) -> Result<Vec<ChapterUnit>> {
    let root = absolute(input_root.as_ref())?;

    let metadata = fs::metadata(&root)
        .await
        .map_err(|e| Error::not_found(&root, e))?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(root));
    }

    let mut chapters = if recursive {
        discover_recursive(&root).await?
    } else {
        discover_flat(&root).await?
    };

    natural::sort_by_key(&mut chapters, |c| c.name.as_str());

    debug!(
        "Discovered {} chapter(s) in '{}' (recursive: {})",
        chapters.len(),
        root.display(),
        recursive
    );

    Ok(chapters)
}

async fn discover_flat(root: &Path) -> Result<Vec<ChapterUnit>> {
    Ok(visible_subdirectories(root)
        .await?
        .into_iter()
        .map(|(name, source_path)| ChapterUnit { name, source_path })
        .collect())
}

async fn discover_recursive(root: &Path) -> Result<Vec<ChapterUnit>> {
    let mut chapters = Vec::new();
    let mut worklist: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = worklist.pop() {
        let subdirectories = visible_subdirectories(&dir).await?;

        if !subdirectories.is_empty() {
            worklist.extend(subdirectories.into_iter().map(|(_, path)| path));
            continue;
        }

        // the root itself is never a chapter
        if dir == root {
            continue;
        }

        let name = dir
            .strip_prefix(root)
            .map(|relative| relative.to_string_lossy().to_string())
            .map_err(|_| {
                Error::Other(format!(
                    "'{}' is not below '{}'",
                    dir.display(),
                    root.display()
                ))
            })?;

        debug!("Leaf directory '{}' is a chapter", name);
        chapters.push(ChapterUnit {
            name,
            source_path: dir,
        });
    }

    Ok(chapters)
}

/// Lists the non-hidden subdirectories of `dir` as `(name, path)` pairs, in directory order.
async fn visible_subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut entries: ReadDir = fs::read_dir(dir)
        .await
        .map_err(|e| Error::not_found(dir, e))?;
    let mut subdirectories = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::not_found(dir, e))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden_name(&name) {
            continue;
        }

        let file_type = entry
            .file_type()
            .await
            .map_err(|e| Error::not_found(entry.path(), e))?;
        if file_type.is_dir() {
            subdirectories.push((name, entry.path()));
        }
    }

    Ok(subdirectories)
}
