//! RustView - Image Browser Core
//!
//! The non-UI half of a desktop image browser: folder listings, image
//! decoding and thumbnail generation, backed by bounded LRU caches whose
//! entries are invalidated when the source file's modification time changes.

mod app;

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod library;
pub mod loader;
pub mod logging;
pub mod progress;

pub use app::run_app;
