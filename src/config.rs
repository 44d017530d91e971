//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file (`--config FILE`, or `config.toml` in the platform config dir)
//! 3. `RUSTVIEW_*` environment variables, e.g. `RUSTVIEW_THUMBNAIL_SIZE=128`
//! 4. CLI flags, applied by the command handlers
//!
//! # Example
//!
//! ```toml
//! image_cache_capacity = 40
//! thumbnail_cache_capacity = 2000
//! thumbnail_size = 192
//! io_threads = 8
//! show_hidden = false
//! ```

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::loader::full::DEFAULT_IMAGE_CACHE_CAPACITY;
use crate::loader::thumbnail::{DEFAULT_THUMBNAIL_CACHE_CAPACITY, DEFAULT_THUMBNAIL_SIZE};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "RUSTVIEW_";

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer could not be read or did not match the schema.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The platform config directory could not be determined.
    #[error("Failed to determine project directories")]
    NoProjectDirs,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of full-size decoded images kept in memory.
    pub image_cache_capacity: usize,
    /// Number of thumbnails kept in memory.
    pub thumbnail_cache_capacity: usize,
    /// Thumbnail bounding box edge, in pixels.
    pub thumbnail_size: u32,
    /// Worker threads used for thumbnail prefetch.
    pub io_threads: usize,
    /// Include dot-files in folder listings.
    pub show_hidden: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_cache_capacity: DEFAULT_IMAGE_CACHE_CAPACITY,
            thumbnail_cache_capacity: DEFAULT_THUMBNAIL_CACHE_CAPACITY,
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            io_threads: 4,
            show_hidden: false,
        }
    }
}

impl Config {
    /// Build the figment for defaults, an optional TOML file and the
    /// environment. A missing file contributes nothing.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load from an explicit file, failing on parse or validation errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] for unreadable or malformed layers and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(Some(path)).extract()?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the default platform-specific path, falling back to the
    /// defaults if anything goes wrong.
    pub fn load() -> Self {
        let result = Self::config_path().and_then(|path| Self::load_from_path(&path));
        match result {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "image_cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.thumbnail_cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "thumbnail_cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.thumbnail_size == 0 {
            return Err(ConfigError::Invalid(
                "thumbnail_size must be at least 1".to_string(),
            ));
        }
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid(
                "io_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Capacity of the full-size image cache.
    #[must_use]
    pub fn image_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.image_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    /// Capacity of the thumbnail cache.
    #[must_use]
    pub fn thumbnail_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.thumbnail_cache_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    /// Save the configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoProjectDirs`] if no home directory is known.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let project_dirs = ProjectDirs::from("com", "rustview", "rustview")
            .ok_or(ConfigError::NoProjectDirs)?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
