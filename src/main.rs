//! # tixpack CLI Entry Point
//!
//! Parses CLI arguments with clap and runs the requested part of the
//! packaging pipeline. With no subcommand the whole pipeline runs, which is
//! what double-clicking the binary does.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use tixpack::capability::{self, PythonResolver};
use tixpack::clean::Unattended;
use tixpack::config::BuildConfig;
use tixpack::error::PipelineError;
use tixpack::interrupt::InterruptFlag;
use tixpack::pipeline::{BuildOutcome, Pipeline};
use tixpack::ui;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
    fn SetConsoleCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "tixpack")]
#[command(about = "Build the TixQuic Grabber download package", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Project root (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Python interpreter used for probing, pip and Nuitka
    #[arg(long, global = true)]
    python: Option<String>,

    /// Show debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline: probe, install, clean, compile, package
    Build {
        /// Start without waiting for Enter
        #[arg(long)]
        yes: bool,
        /// Exit without waiting for Enter
        #[arg(long)]
        no_pause: bool,
        /// Never prompt; a locked output directory fails the build
        #[arg(long)]
        unattended: bool,
    },
    /// Show which optional packages are installed
    Probe {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove and recreate the output and staging directories
    Clean {
        /// Never prompt; a locked directory is an error
        #[arg(long)]
        unattended: bool,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn init_logging(verbose: bool) {
    let mut filter = EnvFilter::from_default_env();
    if verbose && let Ok(directive) = "tixpack=debug".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        None => cmd_build(&cli.root, cli.python, false, false, false),
        Some(Commands::Build {
            yes,
            no_pause,
            unattended,
        }) => cmd_build(&cli.root, cli.python, yes, no_pause, unattended),
        Some(Commands::Probe { json }) => cmd_probe(&cli.root, cli.python, json),
        Some(Commands::Clean { unattended }) => cmd_clean(&cli.root, cli.python, unattended),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn resolve(root: &Option<PathBuf>, python: Option<String>) -> Result<BuildConfig> {
    let root = match root {
        Some(r) => r.clone(),
        None => std::env::current_dir()?,
    };
    BuildConfig::resolve(&root, python)
}

fn pipeline_for(config: BuildConfig, unattended: bool) -> Pipeline {
    let pipeline = Pipeline::new(config);
    if unattended {
        pipeline.with_operator(Unattended)
    } else {
        pipeline
    }
}

fn cmd_build(
    root: &Option<PathBuf>,
    python: Option<String>,
    yes: bool,
    no_pause: bool,
    unattended: bool,
) -> Result<()> {
    let config = resolve(root, python)?;
    ui::banner(&config.app.title);
    println!("{} Project root: {}", "📁".blue(), config.root.display());
    println!("{} Source: {}", "📁".blue(), config.source_dir.display());

    if !(yes || unattended) {
        ui::pause("Press Enter to start the build...")?;
    }

    // installed after the start pause so Ctrl-C there still just exits
    let interrupt = InterruptFlag::new();
    interrupt.install_handler()?;

    let outcome = pipeline_for(config.clone(), unattended)
        .with_interrupt(interrupt)
        .run();
    let ok = outcome.is_done();
    print_outcome(&config, &outcome);

    if !(no_pause || unattended) {
        ui::pause("Press Enter to exit...")?;
    }
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn print_outcome(config: &BuildConfig, outcome: &BuildOutcome) {
    match &outcome.failure {
        None => {
            println!("\n{} Download package built!", "🎉".green());
            println!("{}", "=".repeat(60));
            println!(
                "   {} Staging directory: {}",
                "📁".blue(),
                config.staging_dir.display()
            );
            if let Some(pkg) = &outcome.package {
                println!("   {} Archive: {}", "📦".blue(), pkg.archive.display());
                println!(
                    "   {} Size: {} (app {})",
                    "📊".cyan(),
                    ui::format_mb(pkg.archive_bytes),
                    ui::format_mb(pkg.app_bytes)
                );
                println!("   {} SHA-256: {}", "🔒".blue(), pkg.sha256);
            }
        }
        Some((_, PipelineError::Interrupted)) => {
            println!("\n{} Build interrupted by operator", "x".red());
        }
        Some((stage, err)) => {
            println!("\n{} Build failed while {}: {}", "x".red(), stage, err);
            let hints = err.hints();
            if !hints.is_empty() {
                println!("\n{} Possible fixes:", "💡".yellow());
                for (i, hint) in hints.iter().enumerate() {
                    println!("   {}. {}", i + 1, hint);
                }
            }
        }
    }
}

fn cmd_probe(root: &Option<PathBuf>, python: Option<String>, json: bool) -> Result<()> {
    let config = resolve(root, python)?;
    if json {
        // stdout stays pure JSON
        let report = capability::resolve_all(&PythonResolver::new(config.python));
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let report = Pipeline::new(config).probe();
        println!();
        ui::capability_table(&report).print();
    }
    Ok(())
}

fn cmd_clean(root: &Option<PathBuf>, python: Option<String>, unattended: bool) -> Result<()> {
    let config = resolve(root, python)?;
    if let Err(e) = pipeline_for(config, unattended).clean() {
        println!("{} {}", "x".red(), e);
        std::process::exit(1);
    }
    Ok(())
}
