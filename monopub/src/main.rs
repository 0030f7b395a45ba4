mod commands;
mod config;
mod formatting;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use monopub_core::ReleaseOptions;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::commands::GlobalArgs;
use crate::config::{parse_ignore_dep, IgnoreDep};

#[derive(Parser)]
#[command(name = "monopub")]
#[command(about = "Dependency-ordered release publishing for multi-package workspaces")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file, relative to the working directory [default: monopub.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working directory of the workspace
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(short, long, action, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Release every changed package in dependency order
    Release {
        /// Leave a dependency edge out of ordering, as <package>=<dependency>
        #[arg(long = "ignore-dep", value_name = "PACKAGE=DEPENDENCY", value_parser = parse_ignore_dep)]
        ignore_dep: Vec<IgnoreDep>,
        /// Compute the release plan without changing anything
        #[arg(long, action)]
        dry_run: bool,
        /// Keep publishing unrelated packages after a failure
        #[arg(long, action)]
        continue_on_error: bool,
        #[arg(long, action)]
        json: bool,
    },
    /// Print the release order of the workspace
    Plan {
        #[arg(long = "ignore-dep", value_name = "PACKAGE=DEPENDENCY", value_parser = parse_ignore_dep)]
        ignore_dep: Vec<IgnoreDep>,
        /// Group packages that can be released concurrently
        #[arg(long, action)]
        batches: bool,
        #[arg(long, action)]
        json: bool,
    },
    /// Check the config and the dependency graph
    Validate {
        #[arg(long, action)]
        json: bool,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let log_level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let args = GlobalArgs {
        config: cli.config,
        cwd: cli.cwd,
    };

    match cli.command {
        Commands::Release {
            ignore_dep,
            dry_run,
            continue_on_error,
            json,
        } => {
            let options = ReleaseOptions {
                dry_run,
                continue_on_error,
            };
            commands::cmd_release(&args, &ignore_dep, options, json).await?
        }
        Commands::Plan {
            ignore_dep,
            batches,
            json,
        } => commands::cmd_plan(&args, &ignore_dep, batches, json).await?,
        Commands::Validate { json } => commands::cmd_validate(&args, json).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatting::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
