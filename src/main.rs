//! dupedirs - Inspect the roots and scan states a duplicate scan would use.
//!
//! Usage:
//!   dupedirs --root DIR files            List files that would be scanned
//!   dupedirs --root DIR folders          List folders, children first
//!   dupedirs state PATH...               Show the resolved state of paths
//!   dupedirs subfolders PATH             List immediate subfolders
//!   dupedirs --state FILE roots          Show stored roots and overrides
//!   dupedirs --help                      Show help

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use dupedirs_scan::{
    CancellationToken, Directories, FileRecord, FolderRecord, FsConfig, LocalFs, ScanState,
};

#[derive(Parser)]
#[command(
    name = "dupedirs",
    version,
    about = "Inspect the roots and scan states of a duplicate scan",
    long_about = "dupedirs tracks which directories a duplicate scan covers.\n\n\
                  Roots never overlap, and every folder below them is normal, \
                  reference or excluded. State can be loaded from and saved to \
                  an XML file with --state and --save."
)]
struct Cli {
    /// Load roots and overrides from this file first
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Write roots and overrides to this file after the command
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    #[command(flatten)]
    setup: Setup,

    #[command(flatten)]
    filter: FileFilter,

    #[command(subcommand)]
    command: Command,
}

/// Roots and overrides given on the command line, applied after `--state`.
#[derive(Args)]
struct Setup {
    /// Add a root directory (repeatable)
    #[arg(short, long = "root", value_name = "DIR", global = true)]
    roots: Vec<PathBuf>,

    /// Mark a folder as reference (repeatable)
    #[arg(long = "reference", value_name = "DIR", global = true)]
    references: Vec<PathBuf>,

    /// Mark a folder as excluded (repeatable)
    #[arg(long = "exclude", value_name = "DIR", global = true)]
    excludes: Vec<PathBuf>,

    /// Mark a folder as normal (repeatable)
    #[arg(long = "normal", value_name = "DIR", global = true)]
    normals: Vec<PathBuf>,
}

/// Which files qualify.
#[derive(Args)]
struct FileFilter {
    /// Minimum file size (e.g., "1KB", "1MB")
    #[arg(long, value_name = "SIZE", global = true)]
    min_size: Option<String>,

    /// Maximum file size (e.g., "4GB")
    #[arg(long, value_name = "SIZE", global = true)]
    max_size: Option<String>,

    /// Skip files whose name matches this glob (repeatable)
    #[arg(long = "ignore", value_name = "GLOB", global = true)]
    ignore: Vec<String>,

    /// Treat directories with this extension as single files (repeatable)
    #[arg(long = "bundle", value_name = "EXT", global = true)]
    bundles: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// List every file a scan would visit
    Files {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List every folder, children before their parent
    Folders {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the resolved state of each path
    State {
        /// Paths to resolve
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the immediate subfolders of a folder
    Subfolders {
        /// Folder to list
        path: PathBuf,
    },

    /// Show roots and overrides
    Roots,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_logging();

    let cli = Cli::parse();

    let fs = LocalFs::new(build_fs_config(&cli.filter)?).context("Invalid file filter")?;
    let mut dirs = Directories::new(fs);

    if let Some(path) = &cli.state {
        let summary = dirs.load_from_file(path);
        debug!(?summary, path = %path.display(), "Loaded state");
    }
    apply_setup(&mut dirs, &cli.setup)?;

    match cli.command {
        Command::Files { format } => run_files(&dirs, format)?,
        Command::Folders { format } => run_folders(&dirs, format)?,
        Command::State { paths } => run_state(&dirs, &paths)?,
        Command::Subfolders { path } => run_subfolders(&dirs, &path)?,
        Command::Roots => run_roots(&dirs),
    }

    if let Some(path) = &cli.save {
        dirs.save_to_file(path)
            .with_context(|| format!("Failed to save state to {}", path.display()))?;
        eprintln!("Saved state to {}", path.display());
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

fn build_fs_config(filter: &FileFilter) -> Result<FsConfig> {
    let mut builder = FsConfig::builder();
    if let Some(min) = &filter.min_size {
        builder.min_size(parse_size(min)?);
    }
    if let Some(max) = &filter.max_size {
        builder.max_size(Some(parse_size(max)?));
    }
    builder
        .exclude_patterns(filter.ignore.clone())
        .bundle_extensions(filter.bundles.clone())
        .build()
        .context("Invalid file filter")
}

fn apply_setup(dirs: &mut Directories, setup: &Setup) -> Result<()> {
    for root in &setup.roots {
        let root = root
            .canonicalize()
            .with_context(|| format!("Invalid root: {}", root.display()))?;
        if let Err(err) = dirs.add_root(&root) {
            warn!(%err, "Root not added");
        }
    }

    let overrides = [
        (&setup.normals, ScanState::Normal),
        (&setup.references, ScanState::Reference),
        (&setup.excludes, ScanState::Excluded),
    ];
    for (paths, state) in overrides {
        for path in paths {
            dirs.set_state(&absolute(path)?, state);
        }
    }
    Ok(())
}

/// Make `path` absolute without requiring it to exist.
fn absolute(path: &Path) -> Result<PathBuf> {
    match path.canonicalize() {
        Ok(path) => Ok(path),
        Err(_) => std::path::absolute(path)
            .with_context(|| format!("Invalid path: {}", path.display())),
    }
}

fn require_roots(dirs: &Directories) -> Result<()> {
    if dirs.is_empty() {
        return Err(eyre!("No roots. Add one with --root or load one with --state"));
    }
    Ok(())
}

/// List files that qualify for a scan.
fn run_files(dirs: &Directories, format: OutputFormat) -> Result<()> {
    require_roots(dirs)?;

    let cancel = CancellationToken::new();
    let files: Vec<FileRecord> = dirs
        .files(&cancel)
        .collect::<Result<_, _>>()
        .context("Traversal failed")?;

    match format {
        OutputFormat::Text => {
            let total: u64 = files.iter().map(|f| f.size).sum();
            let references = files.iter().filter(|f| f.is_reference).count();

            for file in &files {
                let marker = if file.is_reference { 'R' } else { ' ' };
                println!(
                    " {} {:>10}  {}",
                    marker,
                    format_size(file.size),
                    file.path.display()
                );
            }
            println!("{}", "─".repeat(60));
            println!(
                " {} files ({} reference), {}",
                files.len(),
                references,
                format_size(total)
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&files)?);
        }
    }

    Ok(())
}

/// List folders in post-order.
fn run_folders(dirs: &Directories, format: OutputFormat) -> Result<()> {
    require_roots(dirs)?;

    let cancel = CancellationToken::new();
    let folders: Vec<FolderRecord> = dirs
        .folders(&cancel)
        .collect::<Result<_, _>>()
        .context("Traversal failed")?;

    match format {
        OutputFormat::Text => {
            for folder in &folders {
                let marker = if folder.is_reference { 'R' } else { ' ' };
                println!(" {}  {}", marker, folder.path.display());
            }
            println!("{}", "─".repeat(60));
            println!(" {} folders", folders.len());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&folders)?);
        }
    }

    Ok(())
}

fn run_state(dirs: &Directories, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let path = absolute(path)?;
        let state = dirs.resolve_state(&path);
        let source = if dirs.has_override(&path) {
            "override"
        } else if dirs.contains(&path) {
            "inherited"
        } else {
            "outside roots"
        };
        println!(" {:<10} {:<14} {}", state, source, path.display());
    }
    Ok(())
}

fn run_subfolders(dirs: &Directories, path: &Path) -> Result<()> {
    let path = absolute(path)?;
    for folder in dirs.list_subfolders(&path) {
        let state = dirs.resolve_state(&folder);
        println!(" {:<10} {}", state, folder.display());
    }
    Ok(())
}

fn run_roots(dirs: &Directories) {
    if dirs.is_empty() {
        println!(" No roots.");
    } else {
        println!(" Roots:");
        for root in dirs.roots().iter() {
            println!("   {}", root.display());
        }
    }

    if !dirs.overrides().is_empty() {
        println!();
        println!(" Overrides:");
        for (path, state) in dirs.overrides().iter() {
            println!("   {:<10} {}", state, path.display());
        }
    }
}

/// Format a size in bytes as human-readable.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "1KB", "1MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();
    let digits = s.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let unit = &s[digits.len()..];

    let multiplier: u64 = match unit {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        "T" | "TB" => 1024 * 1024 * 1024 * 1024,
        _ => return Err(eyre!("Unknown size unit: {unit}")),
    };
    let num: f64 = digits
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;

    Ok((num * multiplier as f64) as u64)
}
