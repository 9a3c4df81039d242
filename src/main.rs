use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doctend::button::ButtonInjector;
use doctend::config::{Config, DEFAULT_CONFIG_PATH};
use doctend::references::ReferenceAggregator;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// doctend - keep a Markdown knowledge base tidy
#[derive(Parser)]
#[command(name = "doctend")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or refresh the "Discuss this page" button on every doc page
    Buttons {
        /// Documentation root (relative to the repository root)
        #[arg(long)]
        docs: Option<PathBuf>,

        /// Repository root
        #[arg(long)]
        root: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Collect outbound links into the references index
    References {
        /// Repository root
        #[arg(long)]
        root: Option<PathBuf>,

        /// Index file (relative to the repository root)
        #[arg(short, long)]
        index: Option<PathBuf>,

        /// Regenerate the whole index instead of appending
        #[arg(long)]
        rebuild: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { force } => {
            anyhow::ensure!(
                force || !cli.config.exists(),
                "{} already exists (use --force to overwrite)",
                cli.config.display()
            );
            Config::default().save(&cli.config)?;
            info!("Wrote {}", cli.config.display());
        }
        Commands::Buttons {
            docs,
            root,
            workers,
            dry_run,
        } => {
            let mut config = Config::load(&cli.config)?;
            if let Some(root) = root {
                config.repo_root = root;
            }
            if let Some(docs) = docs {
                config.docs_dir = docs;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            config.validate()?;

            let summary = ButtonInjector::new(&config)
                .dry_run(dry_run)
                .run()
                .context("button injection failed")?;
            info!(
                "Buttons: {} added, {} replaced, {} up to date, {} failed",
                summary.added, summary.replaced, summary.up_to_date, summary.failed
            );
            if summary.failed > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::References {
            root,
            index,
            rebuild,
            dry_run,
        } => {
            let mut config = Config::load(&cli.config)?;
            if let Some(root) = root {
                config.repo_root = root;
            }
            if let Some(index) = index {
                config.references_file = index;
            }
            config.validate()?;

            let aggregator = ReferenceAggregator::new(&config)?.dry_run(dry_run);
            let summary = if rebuild {
                aggregator.rebuild()
            } else {
                aggregator.run()
            }
            .context("reference aggregation failed")?;
            info!(
                "References: {} files scanned, {} skipped, {} known, {} new",
                summary.scanned_files,
                summary.skipped_files,
                summary.known_links,
                summary.new_links
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
