//! Folder listing and file metadata for the browser.
//!
//! This module provides the filesystem side of the image browser:
//! - Single-level directory listings with image classification
//! - Modification times used as cache validity stamps
//! - Normalized path keys (see [`path_key`])
//!
//! # Example
//!
//! ```no_run
//! use rustview::library::{list_directory, ListOptions};
//! use std::path::Path;
//!
//! let entries = list_directory(Path::new("."), &ListOptions::default()).unwrap();
//! for entry in entries.iter().filter(|e| e.is_image) {
//!     println!("{}", entry.name);
//! }
//! ```

pub mod path_key;

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

pub use path_key::PathKey;

/// File extensions treated as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "ico",
];

/// One row of a folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or directory name (lossy UTF-8).
    pub name: String,
    /// Full path to the entry.
    pub path: PathBuf,
    /// Whether the entry is a directory (symlinks are followed).
    pub is_dir: bool,
    /// Whether the entry is a file with an image extension.
    pub is_image: bool,
    /// Size in bytes, 0 for directories.
    pub size: u64,
    /// Last modification time, if the platform reports one.
    pub modified: Option<SystemTime>,
}

/// Filters applied by [`list_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Include entries whose name starts with `.`.
    pub show_hidden: bool,
    /// Keep only directories and image files.
    pub images_only: bool,
}

/// Errors raised while reading the filesystem.
#[derive(thiserror::Error, Debug)]
pub enum LibraryError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl LibraryError {
    pub(crate) fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Returns true if the path has one of the [`IMAGE_EXTENSIONS`].
#[must_use]
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Last modification time of `path`, following symlinks.
///
/// # Errors
///
/// Returns a [`LibraryError`] if the file cannot be stat'ed or the platform
/// does not report modification times.
pub fn modification_time(path: &Path) -> Result<SystemTime, LibraryError> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| LibraryError::from_io(path, e))
}

/// List the immediate children of `path`.
///
/// Directories come first, then files; each group is ordered by name,
/// case-insensitively, with a byte-wise tie-break. Entries that cannot be
/// read (broken symlinks, races with deletion) are logged and skipped.
///
/// # Errors
///
/// Fails if `path` does not exist, is not a directory, or cannot be read.
pub fn list_directory(path: &Path, options: &ListOptions) -> Result<Vec<DirEntry>, LibraryError> {
    let meta = fs::metadata(path).map_err(|e| LibraryError::from_io(path, e))?;
    if !meta.is_dir() {
        return Err(LibraryError::NotADirectory(path.to_path_buf()));
    }

    let mut entries = Vec::new();
    let walk = WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true);

    for result in walk {
        let entry = match result {
            Ok(entry) => entry,
            Err(err) => {
                if err.depth() == 0 {
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("directory walk failed"));
                    return Err(LibraryError::from_io(path, source));
                }
                log::warn!("Skipping unreadable entry in {}: {}", path.display(), err);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if !options.show_hidden && name.starts_with('.') {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                log::warn!("Skipping {}: {}", entry.path().display(), err);
                continue;
            }
        };

        let is_dir = metadata.is_dir();
        let is_image = !is_dir && is_image_path(entry.path());
        if options.images_only && !is_dir && !is_image {
            continue;
        }

        entries.push(DirEntry {
            name,
            path: entry.into_path(),
            is_dir,
            is_image,
            size: if is_dir { 0 } else { metadata.len() },
            modified: metadata.modified().ok(),
        });
    }

    entries.sort_by(listing_order);
    log::debug!("Listed {} entries in {}", entries.len(), path.display());
    Ok(entries)
}

fn listing_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.is_dir
        .cmp(&a.is_dir)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}
