//! Tests for WebP to PNG normalization and its staging directory lifecycle.

use image::{ImageFormat, Rgb};
use tojiru::error::Result;
use tojiru::prelude::*;

mod common;
use common::{create_dummy_image, create_file, create_files, setup_test_dirs};

#[test]
fn test_needs_conversion() {
    assert!(WebpToPng::needs_conversion(&ImageEntry::new("/a/1.webp", "1.webp")));
    assert!(WebpToPng::needs_conversion(&ImageEntry::new("/a/1.WEBP", "1.WEBP")));
    assert!(!WebpToPng::needs_conversion(&ImageEntry::new("/a/1.png", "1.png")));
    assert!(!WebpToPng::needs_conversion(&ImageEntry::new("/a/webp", "webp")));
}

#[tokio::test]
async fn test_passthrough_keeps_entries() -> Result<()> {
    let entries = vec![
        ImageEntry::new("/a/1.webp", "1.webp"),
        ImageEntry::new("/a/2.jpg", "2.jpg"),
    ];

    let normalized = Passthrough.normalize(entries.clone()).await?;
    assert_eq!(normalized.entries(), entries.as_slice());
    assert!(normalized.staging_dir().is_none());
    normalized.release()?;
    Ok(())
}

#[tokio::test]
async fn test_webp_to_png_without_webp_creates_no_staging() -> Result<()> {
    let test_dirs = setup_test_dirs("normalize_no_webp").await;
    create_files(&test_dirs.source_dir, &["1.jpg", "2.png"]).await?;
    let entries = vec![
        ImageEntry::new(test_dirs.source_dir.join("1.jpg"), "1.jpg"),
        ImageEntry::new(test_dirs.source_dir.join("2.png"), "2.png"),
    ];

    let normalized = WebpToPng.normalize(entries.clone()).await?;
    assert_eq!(normalized.entries(), entries.as_slice());
    assert!(normalized.staging_dir().is_none());
    Ok(())
}

#[tokio::test]
async fn test_webp_to_png_preserves_order() -> Result<()> {
    let test_dirs = setup_test_dirs("normalize_webp").await;
    let dir = &test_dirs.source_dir;
    create_dummy_image(&dir.join("1.jpg"), Rgb([255, 0, 0])).await?;
    create_dummy_image(&dir.join("2.webp"), Rgb([0, 255, 0])).await?;
    create_dummy_image(&dir.join("3.jpg"), Rgb([0, 0, 255])).await?;

    let entries = vec![
        ImageEntry::new(dir.join("1.jpg"), "1.jpg"),
        ImageEntry::new(dir.join("2.webp"), "2.webp"),
        ImageEntry::new(dir.join("3.jpg"), "3.jpg"),
    ];

    let normalized = WebpToPng.normalize(entries.clone()).await?;
    let staging = normalized
        .staging_dir()
        .expect("staging directory for converted pages")
        .to_path_buf();
    let converted = normalized.entries();

    assert_eq!(converted.len(), 3);
    assert_eq!(converted[0], entries[0]);
    assert_eq!(converted[2], entries[2]);
    assert_eq!(converted[1].archive_name, "2.png");
    assert!(converted[1].source_path.starts_with(&staging));

    let bytes = tokio::fs::read(&converted[1].source_path).await?;
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
    assert_eq!(decoded.get_pixel(0, 0), &Rgb([0, 255, 0]));

    // The source is left untouched
    assert!(dir.join("2.webp").exists());

    normalized.release()?;
    assert!(!staging.exists());
    Ok(())
}

#[tokio::test]
async fn test_staging_removed_on_drop() -> Result<()> {
    let test_dirs = setup_test_dirs("normalize_drop").await;
    let source = test_dirs.source_dir.join("cover.WebP");
    create_dummy_image(&source, Rgb([10, 20, 30])).await?;

    let normalized = WebpToPng
        .normalize(vec![ImageEntry::new(&source, "cover.WebP")])
        .await?;
    assert_eq!(normalized.entries()[0].archive_name, "cover.png");
    let staging = normalized.staging_dir().unwrap().to_path_buf();
    assert!(staging.exists());

    drop(normalized);
    assert!(!staging.exists());
    Ok(())
}

#[tokio::test]
async fn test_undecodable_webp_is_read_failure() -> Result<()> {
    let test_dirs = setup_test_dirs("normalize_broken").await;
    let source = test_dirs.source_dir.join("broken.webp");
    create_file(&source, b"RIFF....WEBPnot really").await?;

    let error = WebpToPng
        .normalize(vec![ImageEntry::new(&source, "broken.webp")])
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ReadFailure);
    assert!(matches!(error, Error::Image { ref path, .. } if path == &source));
    Ok(())
}

#[tokio::test]
async fn test_converted_name_collision_is_reported() -> Result<()> {
    let test_dirs = setup_test_dirs("normalize_collision").await;
    let dir = &test_dirs.source_dir;
    create_dummy_image(&dir.join("a.webp"), Rgb([1, 2, 3])).await?;
    create_dummy_image(&dir.join("a.png"), Rgb([4, 5, 6])).await?;

    let error = WebpToPng
        .normalize(vec![
            ImageEntry::new(dir.join("a.png"), "a.png"),
            ImageEntry::new(dir.join("a.webp"), "a.webp"),
        ])
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::WriteFailure);
    assert!(matches!(error, Error::DuplicateEntry(ref name) if name == "a.png"));

    // Two WebP pages differing only in extension case collide as well
    let error = WebpToPng
        .normalize(vec![
            ImageEntry::new(dir.join("a.webp"), "a.webp"),
            ImageEntry::new(dir.join("a.WEBP"), "a.WEBP"),
        ])
        .await
        .unwrap_err();
    assert!(matches!(error, Error::DuplicateEntry(ref name) if name == "a.png"));
    Ok(())
}
