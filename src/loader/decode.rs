//! Image decoding.
//!
//! The [`Decoder`] trait is the seam between the caching loaders and the
//! codec. [`ImageDecoder`] implements it with the `image` crate; tests plug in
//! counting or failing decoders.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, ImageReader};

use super::LoadError;
use crate::library::LibraryError;

/// Opaque key/value metadata attached to a decoded image.
pub type ImageMetadata = BTreeMap<String, String>;

/// A fully decoded image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Decoded pixel buffer.
    pub pixels: DynamicImage,
    /// Container format detected from the file contents.
    pub format: Option<ImageFormat>,
    /// Metadata reported alongside the pixels.
    pub metadata: ImageMetadata,
}

impl DecodedImage {
    /// Wrap a pixel buffer, filling in dimension metadata.
    #[must_use]
    pub fn new(pixels: DynamicImage, format: Option<ImageFormat>) -> Self {
        let mut metadata = ImageMetadata::new();
        metadata.insert("width".to_string(), pixels.width().to_string());
        metadata.insert("height".to_string(), pixels.height().to_string());
        metadata.insert("color_type".to_string(), format!("{:?}", pixels.color()));
        if let Some(format) = format {
            metadata.insert("format".to_string(), format!("{format:?}"));
            metadata.insert("mime".to_string(), format.to_mime_type().to_string());
        }
        Self {
            pixels,
            format,
            metadata,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Turns a file into pixels.
pub trait Decoder: Send + Sync {
    /// Decode the image stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the file cannot be read or decoded.
    fn decode(&self, path: &Path) -> Result<DecodedImage, LoadError>;
}

impl<D: Decoder + ?Sized> Decoder for Arc<D> {
    fn decode(&self, path: &Path) -> Result<DecodedImage, LoadError> {
        (**self).decode(path)
    }
}

/// [`Decoder`] backed by the `image` crate, detecting the format from the
/// file contents rather than its extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageDecoder;

impl Decoder for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, LoadError> {
        let io_err = |e| LoadError::Library(LibraryError::from_io(path, e));

        let reader = ImageReader::open(path)
            .map_err(io_err)?
            .with_guessed_format()
            .map_err(io_err)?;

        let Some(format) = reader.format() else {
            return Err(LoadError::UnsupportedFormat(path.to_path_buf()));
        };

        let pixels = reader.decode().map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        let mut decoded = DecodedImage::new(pixels, Some(format));
        if let Ok(meta) = fs::metadata(path) {
            decoded
                .metadata
                .insert("file_size".to_string(), meta.len().to_string());
        }
        Ok(decoded)
    }
}
