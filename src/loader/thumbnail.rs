//! Thumbnail generation for the grid view.
//!
//! # Overview
//!
//! [`ThumbnailLoader`] decodes an image, scales it to fit a square bounding
//! box and caches the result by path and modification time. [`ThumbnailLoader::prefetch`]
//! fills the cache for a whole folder on a bounded rayon pool so the grid
//! can be drawn from memory.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use image::DynamicImage;
use rayon::prelude::*;
use serde::Serialize;

use super::decode::{DecodedImage, Decoder, ImageDecoder};
use super::LoadError;
use crate::cache::{CacheStats, TimestampedLruCache};
use crate::library::{modification_time, PathKey};
use crate::progress::ProgressCallback;

/// Default number of thumbnails kept in memory.
pub const DEFAULT_THUMBNAIL_CACHE_CAPACITY: usize = 1000;

/// Default bounding box edge for thumbnails, in pixels.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 256;

/// A scaled-down rendition of an image.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Scaled pixels, aspect ratio preserved.
    pub image: DynamicImage,
    /// Width of the source image.
    pub source_width: u32,
    /// Height of the source image.
    pub source_height: u32,
}

impl Thumbnail {
    /// Scale `decoded` to fit inside `max_dimension` × `max_dimension`.
    ///
    /// Images that already fit are kept at their original size.
    #[must_use]
    pub fn render(decoded: &DecodedImage, max_dimension: u32) -> Self {
        let (width, height) = (decoded.width(), decoded.height());
        let image = if width <= max_dimension && height <= max_dimension {
            decoded.pixels.clone()
        } else {
            decoded.pixels.thumbnail(max_dimension, max_dimension)
        };
        Self {
            image,
            source_width: width,
            source_height: height,
        }
    }
}

/// A path that could not be turned into a thumbnail during prefetch.
#[derive(Debug, Clone, Serialize)]
pub struct PrefetchFailure {
    /// Path of the image
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Outcome of a [`ThumbnailLoader::prefetch`] run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrefetchSummary {
    /// Number of paths submitted.
    pub requested: usize,
    /// Thumbnails decoded and rendered during this run.
    pub generated: usize,
    /// Thumbnails already cached with a current mtime.
    pub cached: usize,
    /// Paths that failed.
    pub failures: Vec<PrefetchFailure>,
    /// Wall-clock time of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl PrefetchSummary {
    /// Returns true if any path failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

type ThumbnailCache = TimestampedLruCache<PathKey, Arc<Thumbnail>, SystemTime>;

/// Loads and caches thumbnails.
pub struct ThumbnailLoader<D = ImageDecoder> {
    decoder: D,
    max_dimension: u32,
    io_threads: usize,
    cache: ThumbnailCache,
}

impl ThumbnailLoader<ImageDecoder> {
    /// Create a loader using the `image` crate decoder.
    #[must_use]
    pub fn new(capacity: NonZeroUsize, max_dimension: u32) -> Self {
        Self::with_decoder(ImageDecoder, capacity, max_dimension)
    }
}

impl<D: Decoder> ThumbnailLoader<D> {
    /// Create a loader with a custom decoder.
    #[must_use]
    pub fn with_decoder(decoder: D, capacity: NonZeroUsize, max_dimension: u32) -> Self {
        Self {
            decoder,
            max_dimension: max_dimension.max(1),
            io_threads: 4,
            cache: TimestampedLruCache::new(capacity).with_label("thumbnails"),
        }
    }

    /// Set the number of worker threads used by [`prefetch`](Self::prefetch).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Bounding box edge in pixels.
    #[must_use]
    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Return the thumbnail for `path`, rendering it if the cached copy is
    /// missing or older than the file.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the file cannot be stat'ed or decoded.
    pub fn thumbnail(&self, path: &Path) -> Result<Arc<Thumbnail>, LoadError> {
        self.fetch(path).map(|(thumb, _)| thumb)
    }

    /// Like [`thumbnail`](Self::thumbnail), also reporting whether the result
    /// came from the cache.
    fn fetch(&self, path: &Path) -> Result<(Arc<Thumbnail>, bool), LoadError> {
        let modified = modification_time(path)?;
        let key = PathKey::new(path);

        if let Some(thumb) = self.cache.get(&key, &modified) {
            return Ok((thumb, true));
        }

        let started = Instant::now();
        let decoded = self.decoder.decode(path)?;
        let thumb = Arc::new(Thumbnail::render(&decoded, self.max_dimension));
        log::trace!(
            "Rendered thumbnail for {} ({}x{} -> {}x{}) in {:?}",
            path.display(),
            thumb.source_width,
            thumb.source_height,
            thumb.image.width(),
            thumb.image.height(),
            started.elapsed()
        );

        self.cache.set(key, Arc::clone(&thumb), modified);
        Ok((thumb, false))
    }

    /// Generate thumbnails for `paths` in parallel.
    ///
    /// Failures are collected in the summary and never abort the batch.
    /// Uses up to `io_threads` workers.
    pub fn prefetch(
        &self,
        paths: &[PathBuf],
        progress: Option<&dyn ProgressCallback>,
    ) -> PrefetchSummary {
        let started = Instant::now();
        if let Some(cb) = progress {
            cb.on_phase_start("thumbnails", paths.len());
        }

        let done = AtomicUsize::new(0);
        let work = || {
            paths
                .par_iter()
                .map(|path| {
                    let result = self.fetch(path);
                    if let Some(cb) = progress {
                        let current = done.fetch_add(1, Ordering::Relaxed) + 1;
                        cb.on_progress(current, &path.to_string_lossy());
                    }
                    (path, result)
                })
                .collect::<Vec<_>>()
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.io_threads)
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                log::warn!(
                    "Failed to build thumbnail pool, using global pool: {}",
                    e
                );
                work()
            }
        };

        let mut summary = PrefetchSummary {
            requested: paths.len(),
            ..Default::default()
        };
        for (path, result) in results {
            match result {
                Ok((_, true)) => summary.cached += 1,
                Ok((_, false)) => summary.generated += 1,
                Err(e) => {
                    log::warn!("Thumbnail failed for {}: {}", path.display(), e);
                    summary.failures.push(PrefetchFailure {
                        path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if let Some(cb) = progress {
            cb.on_phase_end("thumbnails");
        }
        log::info!(
            "Thumbnails: {} generated, {} cached, {} failed",
            summary.generated,
            summary.cached,
            summary.failures.len()
        );
        summary
    }

    /// Drop any cached thumbnail for `path`. Returns true if one was resident.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.cache.invalidate(&PathKey::new(path))
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &ThumbnailCache {
        &self.cache
    }

    /// Cache usage counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
