//! Cached image and thumbnail loading.
//!
//! Both loaders follow the same pattern around a
//! [`TimestampedLruCache`](crate::cache::TimestampedLruCache):
//!
//! 1. Read the file's modification time.
//! 2. Look the NFC path key up with that time as the validity stamp.
//! 3. On a miss, decode outside the cache lock and store the result.
//!
//! A file that fails to decode is never cached, so the next request simply
//! tries again.
//!
//! # Example
//!
//! ```no_run
//! use rustview::loader::{ImageLoader, ThumbnailLoader};
//! use std::num::NonZeroUsize;
//! use std::path::Path;
//!
//! let images = ImageLoader::new(NonZeroUsize::new(20).unwrap());
//! let decoded = images.load(Path::new("holiday.png")).unwrap();
//! println!("{}x{}", decoded.width(), decoded.height());
//!
//! let thumbs = ThumbnailLoader::new(NonZeroUsize::new(1000).unwrap(), 256);
//! let thumb = thumbs.thumbnail(Path::new("holiday.png")).unwrap();
//! println!("{}x{}", thumb.image.width(), thumb.image.height());
//! ```

pub mod decode;
pub mod full;
pub mod thumbnail;

use std::path::PathBuf;

use thiserror::Error;

use crate::library::LibraryError;

pub use decode::{DecodedImage, Decoder, ImageDecoder, ImageMetadata};
pub use full::ImageLoader;
pub use thumbnail::{PrefetchFailure, PrefetchSummary, Thumbnail, ThumbnailLoader};

/// Errors that can occur while loading an image or thumbnail.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be stat'ed or opened.
    #[error(transparent)]
    Library(#[from] LibraryError),

    /// The file was read but its contents could not be decoded.
    #[error("Failed to decode image {path}: {source}")]
    Decode {
        /// Path of the image
        path: PathBuf,
        /// The underlying codec error
        #[source]
        source: image::ImageError,
    },

    /// The file contents match no known image format.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(PathBuf),
}
