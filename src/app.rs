//! Command handlers wiring the CLI to the library, loaders and caches.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytesize::ByteSize;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::cli::{Cli, Commands, ConfigCommand, ListArgs, OutputFormat, ThumbnailArgs, ViewArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::library::{list_directory, DirEntry, ListOptions};
use crate::loader::{ImageLoader, ImageMetadata, PrefetchFailure, PrefetchSummary, ThumbnailLoader};
use crate::logging::{current_level_name, init_logging};
use crate::progress::Progress;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the folder cannot be read,
/// or nothing requested could be loaded.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);
    log::debug!("Log level: {}", current_level_name());

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };

    match cli.command {
        Commands::List(args) => run_list(&args, &config),
        Commands::View(args) => run_view(&args, &config),
        Commands::Thumbnails(args) => run_thumbnails(&args, config, cli.quiet),
        Commands::Config(action) => run_config(&action, &config, cli.config.as_deref()),
    }
}

fn run_config(action: &ConfigCommand, config: &Config, explicit: Option<&Path>) -> Result<ExitCode> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    let mut out = io::stdout().lock();
    match action {
        ConfigCommand::Show => write!(out, "{}", toml::to_string_pretty(config)?)?,
        ConfigCommand::Path => writeln!(out, "{}", path.display())?,
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            config
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote configuration to {}", path.display());
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(ExitCode::Success)
}

#[derive(Debug, Serialize)]
struct ListingRow<'a> {
    name: &'a str,
    path: &'a Path,
    is_dir: bool,
    is_image: bool,
    size: u64,
    modified: Option<DateTime<Utc>>,
}

impl<'a> From<&'a DirEntry> for ListingRow<'a> {
    fn from(entry: &'a DirEntry) -> Self {
        Self {
            name: &entry.name,
            path: &entry.path,
            is_dir: entry.is_dir,
            is_image: entry.is_image,
            size: entry.size,
            modified: entry.modified.map(DateTime::<Utc>::from),
        }
    }
}

fn run_list(args: &ListArgs, config: &Config) -> Result<ExitCode> {
    let options = ListOptions {
        show_hidden: args.all || config.show_hidden,
        images_only: args.images_only,
    };
    let entries = list_directory(&args.path, &options)
        .with_context(|| format!("Failed to list {}", args.path.display()))?;

    let mut out = io::stdout().lock();
    match args.format {
        OutputFormat::Json => {
            let rows: Vec<ListingRow<'_>> = entries.iter().map(ListingRow::from).collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        }
        OutputFormat::Text => {
            for entry in &entries {
                let kind = if entry.is_dir {
                    'd'
                } else if entry.is_image {
                    'i'
                } else {
                    '-'
                };
                let size = if entry.is_dir {
                    String::from("-")
                } else {
                    ByteSize(entry.size).to_string()
                };
                let modified = entry
                    .modified
                    .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                writeln!(out, "{kind} {size:>10} {modified:>16} {}", entry.name)?;
            }
        }
    }
    Ok(ExitCode::Success)
}

#[derive(Debug, Serialize)]
struct ViewReport<'a> {
    path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<ImageMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn run_view(args: &ViewArgs, config: &Config) -> Result<ExitCode> {
    config.validate()?;
    let loader = ImageLoader::new(config.image_capacity());

    let mut reports = Vec::with_capacity(args.paths.len());
    let mut first_error = None;
    for path in &args.paths {
        match loader.load(path) {
            Ok(image) => reports.push(ViewReport {
                path,
                width: Some(image.width()),
                height: Some(image.height()),
                metadata: Some(image.metadata.clone()),
                error: None,
            }),
            Err(e) => {
                reports.push(ViewReport {
                    path,
                    width: None,
                    height: None,
                    metadata: None,
                    error: Some(e.to_string()),
                });
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    log_cache_stats("images", &loader.stats());

    let mut out = io::stdout().lock();
    match args.format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&reports)?)?,
        OutputFormat::Text => {
            for report in &reports {
                match (&report.error, &report.metadata) {
                    (Some(error), _) => writeln!(out, "{}: error: {}", report.path.display(), error)?,
                    (None, Some(metadata)) => {
                        writeln!(
                            out,
                            "{}: {}x{}",
                            report.path.display(),
                            report.width.unwrap_or_default(),
                            report.height.unwrap_or_default()
                        )?;
                        for (key, value) in metadata {
                            writeln!(out, "  {key}: {value}")?;
                        }
                    }
                    (None, None) => {}
                }
            }
        }
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    match first_error {
        Some(e) if failed == reports.len() => Err(e).context("No image could be loaded"),
        Some(_) => Ok(ExitCode::PartialSuccess),
        None => Ok(ExitCode::Success),
    }
}

#[derive(Debug, Serialize)]
struct ThumbnailReport<'a> {
    summary: &'a PrefetchSummary,
    written: usize,
    cache: CacheStats,
}

fn run_thumbnails(args: &ThumbnailArgs, mut config: Config, quiet: bool) -> Result<ExitCode> {
    if let Some(size) = args.size {
        config.thumbnail_size = size;
    }
    if let Some(threads) = args.io_threads {
        config.io_threads = threads;
    }
    config.validate()?;

    let options = ListOptions {
        show_hidden: args.all || config.show_hidden,
        images_only: true,
    };
    let paths: Vec<PathBuf> = list_directory(&args.path, &options)
        .with_context(|| format!("Failed to list {}", args.path.display()))?
        .into_iter()
        .filter(|entry| entry.is_image)
        .map(|entry| entry.path)
        .collect();

    if paths.is_empty() {
        log::info!("No images found in {}", args.path.display());
        return Ok(ExitCode::NoImages);
    }

    let loader = ThumbnailLoader::new(config.thumbnail_capacity(), config.thumbnail_size)
        .with_io_threads(config.io_threads);
    let progress = Progress::new(quiet || args.format == OutputFormat::Json);
    let mut summary = loader.prefetch(&paths, Some(&progress));

    let written = match &args.output {
        Some(dir) => write_thumbnails(&loader, &paths, &mut summary, dir)?,
        None => 0,
    };

    let stats = loader.stats();
    log_cache_stats("thumbnails", &stats);

    let mut out = io::stdout().lock();
    match args.format {
        OutputFormat::Json => {
            let report = ThumbnailReport {
                summary: &summary,
                written,
                cache: stats,
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        OutputFormat::Text => {
            writeln!(
                out,
                "{} images: {} generated, {} cached, {} failed in {} ms",
                summary.requested,
                summary.generated,
                summary.cached,
                summary.failures.len(),
                summary.elapsed_ms
            )?;
            for failure in &summary.failures {
                writeln!(out, "  {}: {}", failure.path.display(), failure.error)?;
            }
            if let Some(dir) = &args.output {
                writeln!(out, "Wrote {} thumbnails to {}", written, dir.display())?;
            }
        }
    }

    if summary.failures.len() == summary.requested {
        anyhow::bail!("No thumbnail could be generated in {}", args.path.display());
    }
    if summary.has_failures() {
        Ok(ExitCode::PartialSuccess)
    } else {
        Ok(ExitCode::Success)
    }
}

/// Save every successfully prefetched thumbnail as `<file name>.png`.
///
/// A file that can no longer be loaded or written is added to the summary's
/// failures and the export continues.
fn write_thumbnails(
    loader: &ThumbnailLoader,
    paths: &[PathBuf],
    summary: &mut PrefetchSummary,
    dir: &Path,
) -> Result<usize> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let failed: HashSet<PathBuf> = summary.failures.iter().map(|f| f.path.clone()).collect();
    let mut written = 0;
    for path in paths {
        if failed.contains(path) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        let mut file_name = name.to_os_string();
        file_name.push(".png");
        let target = dir.join(file_name);

        let result = loader
            .thumbnail(path)
            .map_err(anyhow::Error::from)
            .and_then(|thumb| {
                thumb
                    .image
                    .to_rgba8()
                    .save(&target)
                    .with_context(|| format!("Failed to write {}", target.display()))
            });
        match result {
            Ok(()) => written += 1,
            Err(e) => {
                log::warn!("Export failed for {}: {:#}", path.display(), e);
                summary.failures.push(PrefetchFailure {
                    path: path.clone(),
                    error: format!("{e:#}"),
                });
            }
        }
    }
    Ok(written)
}

fn log_cache_stats(label: &str, stats: &CacheStats) {
    log::debug!(
        "{} cache: {} hits, {} misses ({} stale), {} evictions, {}/{} resident, hit ratio {:.2}",
        label,
        stats.hits,
        stats.misses,
        stats.stale,
        stats.evictions,
        stats.resident,
        stats.capacity,
        stats.hit_ratio()
    );
}
