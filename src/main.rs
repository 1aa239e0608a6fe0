use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use archnav::analysis::analyze_workspace;
use archnav::config::Config;
use archnav::discovery::discover;
use archnav::export::{export, ExportData, ExportFormat};

#[derive(Parser)]
#[command(name = "archnav")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Module dependency graph and architecture metrics for Go, Python and TypeScript projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the module architecture of a project
    Analyze {
        /// Path to analyze (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format: json or markdown
        #[arg(short, long, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Config file (defaults to archnav.toml in the scanned directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Worker threads for parsing (0 = one per core)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Additional entry module, relative to the scanned directory
        #[arg(short, long = "entry")]
        entries: Vec<String>,
    },
    /// Show version information
    Version,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean report.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Analyze {
            path,
            format,
            config,
            workers,
            entries,
        }) => run_analyze(&path, format, config.as_deref(), workers, entries),
        Some(Commands::Version) => {
            println!("archnav v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => {
            println!("archnav - module architecture analyzer");
            println!("Run 'archnav analyze <path>' to analyze a project");
            println!("Run 'archnav --help' for more information");
            Ok(())
        }
    }
}

fn run_analyze(
    path: &Path,
    format: ExportFormat,
    config_path: Option<&Path>,
    workers: Option<usize>,
    entries: Vec<String>,
) -> Result<()> {
    let config = match config_path {
        Some(file) => Config::load(file),
        None => Config::discover(path),
    }
    .context("Failed to load configuration")?;

    let mut options = config.analysis_options();
    if let Some(workers) = workers {
        options.workers = workers;
    }
    options.entry_points.extend(entries);

    let discovery = discover(path, &config.discovery)
        .with_context(|| format!("Failed to scan {}", path.display()))?;
    info!(
        files = discovery.files.len(),
        roots = discovery.manifests.len(),
        "Discovered files"
    );

    let metrics = analyze_workspace(&discovery.files, &discovery.manifests, &options);

    let project_name = path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| path.display().to_string());
    let data = ExportData::new(project_name, discovery.files.len(), metrics);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    export(format, &data, &mut out).context("Failed to write report")?;
    out.flush().context("Failed to write report")?;

    Ok(())
}
