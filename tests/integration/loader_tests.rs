use filetime::{set_file_mtime, FileTime};
use rustview::library::LibraryError;
use rustview::loader::{
    DecodedImage, Decoder, ImageDecoder, ImageLoader, LoadError, ThumbnailLoader,
};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

#[derive(Default)]
struct CountingDecoder {
    calls: AtomicUsize,
}

impl CountingDecoder {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decoder for CountingDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ImageDecoder.decode(path)
    }
}

fn cap(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn write_png(path: &Path, width: u32, height: u32, mtime_secs: i64) {
    image::RgbImage::new(width, height).save(path).unwrap();
    set_file_mtime(path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
}

#[test]
fn test_image_reloaded_after_mtime_change() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo.png");
    write_png(&path, 10, 10, 1_000_000);

    let decoder = Arc::new(CountingDecoder::default());
    let loader = ImageLoader::with_decoder(Arc::clone(&decoder), cap(20));

    let first = loader.load(&path).unwrap();
    assert_eq!(first.width(), 10);
    loader.load(&path).unwrap();
    assert_eq!(decoder.calls(), 1);

    // Replace the file with a different image and a newer timestamp.
    write_png(&path, 30, 20, 1_000_100);
    let reloaded = loader.load(&path).unwrap();

    assert_eq!((reloaded.width(), reloaded.height()), (30, 20));
    assert_eq!(decoder.calls(), 2);
    let stats = loader.stats();
    assert_eq!(stats.stale, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.resident, 1);
}

#[test]
fn test_same_mtime_serves_cached_pixels() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("photo.png");
    write_png(&path, 10, 10, 2_000_000);

    let loader = ImageLoader::new(cap(20));
    let first = loader.load(&path).unwrap();

    // Content changes but the timestamp is pinned: the cache cannot tell.
    write_png(&path, 40, 40, 2_000_000);
    let second = loader.load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_decode_failure_retried_on_next_access() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("later.png");
    fs::write(&path, b"still downloading").unwrap();

    let decoder = Arc::new(CountingDecoder::default());
    let loader = ImageLoader::with_decoder(Arc::clone(&decoder), cap(4));

    assert!(matches!(loader.load(&path), Err(LoadError::Decode { .. })));
    assert!(loader.load(&path).is_err());
    assert_eq!(decoder.calls(), 2);
    assert!(loader.cache().is_empty());

    write_png(&path, 5, 5, 3_000_000);
    assert_eq!(loader.load(&path).unwrap().width(), 5);
    assert_eq!(decoder.calls(), 3);
}

#[test]
fn test_deleted_file_reports_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.png");
    write_png(&path, 2, 2, 4_000_000);

    let loader = ImageLoader::new(cap(4));
    loader.load(&path).unwrap();
    fs::remove_file(&path).unwrap();

    let err = loader.load(&path).unwrap_err();
    assert!(matches!(err, LoadError::Library(LibraryError::NotFound(_))));
}

#[test]
fn test_image_cache_capacity_respected() {
    let dir = tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..5)
        .map(|i| {
            let path = dir.path().join(format!("{i}.png"));
            write_png(&path, 3, 3, 5_000_000);
            path
        })
        .collect();

    let decoder = Arc::new(CountingDecoder::default());
    let loader = ImageLoader::with_decoder(Arc::clone(&decoder), cap(2));
    for path in &paths {
        loader.load(path).unwrap();
    }
    assert_eq!(loader.cache().len(), 2);
    assert_eq!(loader.stats().evictions, 3);

    // Last two are resident, the first one must be decoded again.
    loader.load(&paths[4]).unwrap();
    loader.load(&paths[3]).unwrap();
    assert_eq!(decoder.calls(), 5);
    loader.load(&paths[0]).unwrap();
    assert_eq!(decoder.calls(), 6);
}

#[test]
fn test_thumbnail_refreshes_after_mtime_change() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wide.png");
    write_png(&path, 200, 100, 6_000_000);

    let decoder = Arc::new(CountingDecoder::default());
    let loader = ThumbnailLoader::with_decoder(Arc::clone(&decoder), cap(1000), 50);

    let thumb = loader.thumbnail(&path).unwrap();
    assert_eq!((thumb.image.width(), thumb.image.height()), (50, 25));

    write_png(&path, 100, 200, 6_000_050);
    let thumb = loader.thumbnail(&path).unwrap();
    assert_eq!((thumb.image.width(), thumb.image.height()), (25, 50));
    assert_eq!(decoder.calls(), 2);
}

#[test]
fn test_prefetch_then_grid_reads_hit_cache() {
    let dir = tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..12)
        .map(|i| {
            let path = dir.path().join(format!("grid_{i:02}.png"));
            write_png(&path, 16, 16, 7_000_000);
            path
        })
        .collect();

    let decoder = Arc::new(CountingDecoder::default());
    let loader =
        ThumbnailLoader::with_decoder(Arc::clone(&decoder), cap(1000), 8).with_io_threads(4);

    let summary = loader.prefetch(&paths, None);
    assert_eq!(summary.generated, 12);
    assert!(!summary.has_failures());

    for path in &paths {
        loader.thumbnail(path).unwrap();
    }
    assert_eq!(decoder.calls(), 12);
    assert_eq!(loader.stats().hits, 12);
}

#[test]
fn test_shared_decoder_between_loaders() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("both.png");
    write_png(&path, 64, 64, 8_000_000);

    let decoder = Arc::new(CountingDecoder::default());
    let images = ImageLoader::with_decoder(Arc::clone(&decoder), cap(20));
    let thumbs = ThumbnailLoader::with_decoder(Arc::clone(&decoder), cap(1000), 32);

    images.load(&path).unwrap();
    thumbs.thumbnail(&path).unwrap();
    // Each loader owns its cache, so each decodes once.
    assert_eq!(decoder.calls(), 2);
    assert!(images.invalidate(&path));
    assert!(thumbs.cache().contains(&rustview::library::PathKey::new(&path)));
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_never_share_an_entry() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let small = dir.path().join(OsStr::from_bytes(b"img\xff.png"));
    let large = dir.path().join(OsStr::from_bytes(b"img\xfe.png"));
    write_png(&small, 10, 10, 1_000);
    write_png(&large, 30, 20, 1_000);

    let decoder = Arc::new(CountingDecoder::default());
    let loader = ImageLoader::with_decoder(Arc::clone(&decoder), cap(20));

    let a = loader.load(&small).unwrap();
    let b = loader.load(&large).unwrap();
    assert_eq!((a.width(), a.height()), (10, 10));
    assert_eq!((b.width(), b.height()), (30, 20));
    assert_eq!(decoder.calls(), 2);
    assert_eq!(loader.cache().len(), 2);

    let thumbs = ThumbnailLoader::new(cap(1000), 256);
    assert_eq!(thumbs.thumbnail(&small).unwrap().source_width, 10);
    assert_eq!(thumbs.thumbnail(&large).unwrap().source_width, 30);
}
