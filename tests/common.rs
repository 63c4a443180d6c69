//! Common test utilities and constants for the Tojiru crate.
//!
//! Provides functions for setting up test directories, creating dummy image
//! files and reading archives back.

use image::{Rgb, RgbImage};
use rand::{Rng, distributions::Alphanumeric};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tojiru::error::{Error, Result};
use tokio::fs;

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);
#[allow(dead_code)]
pub const LONG_TEST_TIMEOUT: Duration = Duration::from_secs(120); // For full conversions with transcoding

/// Per-test directory layout: `<test_dir>/source` and `<test_dir>/target`.
#[allow(dead_code)]
pub struct TestDirs {
    pub test_dir: PathBuf,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
}

/// Creates a clean, uniquely named test directory with source and target subdirectories.
#[allow(dead_code)]
pub async fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let test_dir = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if test_dir.exists() {
        fs::remove_dir_all(&test_dir).await.unwrap();
    }
    let source_dir = test_dir.join("source");
    let target_dir = test_dir.join("target");

    fs::create_dir_all(&source_dir).await.unwrap();
    fs::create_dir_all(&target_dir).await.unwrap();

    TestDirs {
        test_dir,
        source_dir,
        target_dir,
    }
}

/// Writes a small solid-color image; the format follows the file extension.
#[allow(dead_code)]
pub async fn create_dummy_image(path: &Path, color: Rgb<u8>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let img = RgbImage::from_pixel(16, 16, color);
    let path_clone = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        img.save(&path_clone).map_err(|source| Error::Image {
            path: path_clone.clone(),
            source,
        })
    })
    .await
    .map_err(|e| Error::AsyncTaskError(e.to_string()))??;
    Ok(())
}

/// Creates a red image at the given path.
#[allow(dead_code)]
pub async fn create_dummy_color_image(path: &Path) -> Result<()> {
    create_dummy_image(path, Rgb([255, 0, 0])).await
}

/// Writes arbitrary bytes, creating parent directories as needed.
#[allow(dead_code)]
pub async fn create_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, contents).await?;
    Ok(())
}

/// Creates one file per name inside `dir`, each containing its own name.
#[allow(dead_code)]
pub async fn create_files(dir: &Path, names: &[&str]) -> Result<()> {
    for name in names {
        create_file(&dir.join(name), name.as_bytes()).await?;
    }
    Ok(())
}

/// Reads every entry of a ZIP archive as `(name, bytes, compression method)` in stored order.
#[allow(dead_code)]
pub fn read_zip_entries(path: &Path) -> Vec<(String, Vec<u8>, zip::CompressionMethod)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        entries.push((entry.name().to_string(), bytes, entry.compression()));
    }
    entries
}

/// Lists the file names in `dir`, sorted.
#[allow(dead_code)]
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
