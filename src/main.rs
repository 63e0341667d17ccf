use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use apiscope::export::{self, EnvExtractor, ExportData, ExportFormat};
use apiscope::{ScanConfig, Scanner};

#[derive(Parser)]
#[command(name = "apiscope")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Static inventory of outbound HTTP calls and the code behind them", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project for API calls
    Scan(ScanArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct ScanArgs {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root directory to scan (overrides the config file)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Route handler directory, relative to the root
    #[arg(long)]
    api_routes_dir: Option<PathBuf>,

    /// Line cap for extracted function code
    #[arg(long)]
    max_function_lines: Option<usize>,

    /// Output format: json, json-compact, summary
    #[arg(short, long, default_value = "json")]
    format: ExportFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write one Markdown file per endpoint into this directory
    #[arg(long)]
    split_dir: Option<PathBuf>,

    /// List environment variables read by the extracted code
    #[arg(long)]
    env: bool,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn scan(args: ScanArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScanConfig::new("."),
    };
    if let Some(root) = args.root {
        config.root_dir = root;
    }
    if let Some(dir) = args.api_routes_dir {
        config.api_routes_dir = Some(dir);
    }
    if let Some(lines) = args.max_function_lines {
        config.max_function_lines = lines;
    }
    let config = config.validate().context("invalid scan configuration")?;

    info!(root = %config.root_dir.display(), "scanning");
    let result = Scanner::new(config).scan().context("scan failed to start")?;

    let mut data = ExportData::new(&result);
    if args.env {
        let extractor = EnvExtractor::new().context("building env extractor")?;
        data = data.with_env_parameters(&extractor);
    }

    match &args.output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            export::export(args.format, &data, &mut writer)?;
            writer.flush()?;
            info!(output = %path.display(), "results written");
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            export::export(args.format, &data, &mut writer)?;
        }
    }

    if let Some(dir) = args.split_dir {
        let written = export::split_endpoints(&data, &dir)
            .with_context(|| format!("writing endpoint files to {}", dir.display()))?;
        info!(files = written.len(), dir = %dir.display(), "endpoint files written");
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Scan(args)) => scan(args),
        Some(Commands::Version) => {
            println!("apiscope v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        None => {
            println!("apiscope - API call inventory for JavaScript/TypeScript projects");
            println!("Run 'apiscope scan' to scan the current directory");
            println!("Run 'apiscope --help' for more information");
            Ok(())
        }
    }
}
