//! Command-line interface definitions for RustView.
//!
//! # Example
//!
//! ```bash
//! # List a folder, directories first
//! rustview list ~/Pictures
//!
//! # Decode images and print their metadata
//! rustview view ~/Pictures/a.png ~/Pictures/b.jpg
//!
//! # Prefetch the thumbnail grid and write the thumbnails out
//! rustview thumbnails ~/Pictures --size 128 --output /tmp/thumbs
//!
//! # Write the default configuration file
//! rustview config init
//!
//! # Verbose mode shows decode timings; -vv shows cache decisions
//! rustview -vv thumbnails ~/Pictures
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Image browser core: folder listing, decoding and cached thumbnails.
#[derive(Debug, Parser)]
#[command(name = "rustview")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for RustView.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the contents of a folder
    List(ListArgs),
    /// Decode images and print their dimensions and metadata
    View(ViewArgs),
    /// Generate thumbnails for every image in a folder
    Thumbnails(ThumbnailArgs),
    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Configuration file actions.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Write the effective configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the path of the config file
    Path,
}

/// Arguments for the list subcommand.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Folder to list
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    /// Include hidden entries (names starting with .)
    #[arg(short, long)]
    pub all: bool,

    /// Show only folders and images
    #[arg(long)]
    pub images_only: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the view subcommand.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Image files to decode (a repeated path is served from the cache)
    #[arg(value_name = "FILE", required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the thumbnails subcommand.
#[derive(Debug, Args)]
pub struct ThumbnailArgs {
    /// Folder whose images should be thumbnailed
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    /// Thumbnail bounding box edge in pixels (overrides config)
    #[arg(long, value_name = "PIXELS")]
    pub size: Option<u32>,

    /// Number of worker threads (overrides config)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Write each thumbnail as PNG into this directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Include hidden images
    #[arg(short, long)]
    pub all: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
