//! Unicode-normalized cache keys for file paths.
//!
//! macOS reports file names in NFD (decomposed) form while most other sources
//! produce NFC (composed) strings, so the same visible name can arrive with two
//! byte representations:
//!
//! - NFC: `café.jpg`, 'é' is U+00E9
//! - NFD: `café.jpg`, 'e' U+0065 followed by combining acute U+0301
//!
//! Keys are stored in NFC so both spellings share one cache entry. Paths that
//! are not valid UTF-8 are kept byte-for-byte; they are never merged with
//! another path.
//!
//! # Example
//!
//! ```
//! use rustview::library::PathKey;
//! use std::path::Path;
//!
//! let nfc = PathKey::new(Path::new("photos/café.jpg"));
//! let nfd = PathKey::new(Path::new("photos/cafe\u{0301}.jpg"));
//! assert_eq!(nfc, nfd);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use unicode_normalization::{is_nfc, UnicodeNormalization};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Repr {
    /// NFC-normalized UTF-8 path.
    Nfc(String),
    /// Exact OS path, for names that are not valid UTF-8.
    Raw(PathBuf),
}

/// Normalized path used as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(Repr);

impl PathKey {
    /// Build a key from a path.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        match path.to_str() {
            Some(s) if is_nfc(s) => Self(Repr::Nfc(s.to_owned())),
            Some(s) => Self(Repr::Nfc(s.nfc().collect())),
            None => Self(Repr::Raw(path.to_path_buf())),
        }
    }

    /// The normalized path string, or `None` for a path that is not valid
    /// UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            Repr::Nfc(s) => Some(s),
            Repr::Raw(_) => None,
        }
    }

    /// Returns true if the key holds the path's exact bytes rather than a
    /// normalized string.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self.0, Repr::Raw(_))
    }
}

impl From<&Path> for PathKey {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Nfc(s) => f.write_str(s),
            Repr::Raw(path) => write!(f, "{}", path.display()),
        }
    }
}
