//! Full-size image loading for the viewer.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use super::decode::{DecodedImage, Decoder, ImageDecoder};
use super::LoadError;
use crate::cache::{CacheStats, TimestampedLruCache};
use crate::library::{modification_time, PathKey};

/// Default number of full-size images kept decoded.
pub const DEFAULT_IMAGE_CACHE_CAPACITY: usize = 20;

type ImageCache = TimestampedLruCache<PathKey, Arc<DecodedImage>, SystemTime>;

/// Loads full-size images, caching decoded pixels by path and mtime.
pub struct ImageLoader<D = ImageDecoder> {
    decoder: D,
    cache: ImageCache,
}

impl ImageLoader<ImageDecoder> {
    /// Create a loader using the `image` crate decoder.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self::with_decoder(ImageDecoder, capacity)
    }
}

impl<D: Decoder> ImageLoader<D> {
    /// Create a loader with a custom decoder.
    #[must_use]
    pub fn with_decoder(decoder: D, capacity: NonZeroUsize) -> Self {
        Self {
            decoder,
            cache: TimestampedLruCache::new(capacity).with_label("images"),
        }
    }

    /// Load the image at `path`, decoding it only if the cached copy is
    /// missing or older than the file.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the file cannot be stat'ed or decoded.
    pub fn load(&self, path: &Path) -> Result<Arc<DecodedImage>, LoadError> {
        let modified = modification_time(path)?;
        self.cache
            .get_or_insert_with(PathKey::new(path), modified, || -> Result<_, LoadError> {
                let started = Instant::now();
                let decoded = self.decoder.decode(path)?;
                log::debug!(
                    "Decoded {} ({}x{}) in {:?}",
                    path.display(),
                    decoded.width(),
                    decoded.height(),
                    started.elapsed()
                );
                Ok(Arc::new(decoded))
            })
            .inspect_err(|e| log::warn!("Failed to load {}: {}", path.display(), e))
    }

    /// Drop any cached copy of `path`. Returns true if one was resident.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.cache.invalidate(&PathKey::new(path))
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Cache usage counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
