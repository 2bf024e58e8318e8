//! Standalone compilation with Nuitka.
//!
//! The command is assembled from the resolved [`BuildConfig`] and the
//! capability report, then handed to a [`CompilerRunner`]. Compilation
//! failures are never retried.

use crate::capability::{Capability, CapabilityReport};
use crate::config::BuildConfig;
use crate::error::PipelineError;
use crate::process::{self, ProcessExit};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

/// Capabilities bundled with `--include-package`, in flag order.
pub const INCLUDE_ORDER: [Capability; 5] = [
    Capability::Tkinter,
    Capability::Requests,
    Capability::OpenAi,
    Capability::Selenium,
    Capability::Playwright,
];

pub const OPTIMIZATION_FLAGS: [&str; 4] = [
    "--lto=yes",
    "--enable-plugin=anti-bloat",
    "--nofollow-import-to=pytest",
    "--nofollow-import-to=unittest",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl CompileCommand {
    pub fn build(config: &BuildConfig, report: &CapabilityReport) -> Self {
        let mut args = vec![
            "-m".to_string(),
            "nuitka".to_string(),
            "--standalone".to_string(),
            format!("--output-dir={}", config.dist_dir.display()),
            format!("--output-filename={}", config.app.executable),
            "--assume-yes-for-downloads".to_string(),
            "--windows-console-mode=disable".to_string(),
            "--remove-output".to_string(),
            config.entry_file.display().to_string(),
        ];

        for cap in INCLUDE_ORDER {
            if report.has(cap) {
                args.push(format!("--include-package={}", cap.module()));
            }
        }

        args.extend(OPTIMIZATION_FLAGS.iter().map(|f| f.to_string()));

        if config.icon_file.exists() {
            args.push(format!(
                "--windows-icon-from-ico={}",
                config.icon_file.display()
            ));
        }

        Self {
            program: config.python.clone(),
            args,
        }
    }

    pub fn includes(&self) -> Vec<&str> {
        self.args
            .iter()
            .filter_map(|a| a.strip_prefix("--include-package="))
            .collect()
    }
}

impl fmt::Display for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.args.join(" "))
    }
}

pub trait CompilerRunner {
    fn run(&self, command: &CompileCommand, cwd: &Path) -> io::Result<ProcessExit>;
}

/// Runs the compiler in the foreground.
///
/// The compiler streams its own progress to the inherited terminal, so the
/// spinner stays hidden while it runs and only reports the elapsed time once
/// it exits.
pub struct NuitkaRunner;

impl CompilerRunner for NuitkaRunner {
    fn run(&self, command: &CompileCommand, cwd: &Path) -> io::Result<ProcessExit> {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }

        let result =
            pb.suspend(|| process::run_inherited(&command.program, &command.args, Some(cwd)));

        match &result {
            Ok(exit) => pb.finish_with_message(format!("Compiler finished ({})", exit.describe())),
            Err(_) => pb.finish_and_clear(),
        }
        result
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompileOutcome {
    pub elapsed: Duration,
}

/// Compile the entry file. Fails before spawning anything when it is missing.
pub fn compile(
    config: &BuildConfig,
    report: &CapabilityReport,
    runner: &dyn CompilerRunner,
) -> Result<CompileOutcome, PipelineError> {
    println!("{} Compiling...", "🔨".cyan());

    if !config.entry_file.exists() {
        println!(
            "{} Entry file not found: {}",
            "x".red(),
            config.entry_file.display()
        );
        return Err(PipelineError::CompileMissingSource {
            path: config.entry_file.clone(),
        });
    }

    let command = CompileCommand::build(config, report);
    let includes = command.includes();
    if includes.is_empty() {
        println!("   {} Bundled packages: (none)", "📋".blue());
    } else {
        println!("   {} Bundled packages: {}", "📋".blue(), includes.join(", "));
    }
    println!("   {} Expected time: 15-20 minutes", "⏰".yellow());
    tracing::info!(%command, "compiler command");

    let start = Instant::now();
    let exit = runner
        .run(&command, &config.root)
        .map_err(|e| PipelineError::CompileFailure {
            detail: format!("failed to run {}: {}", command.program, e),
        })?;

    match exit {
        ProcessExit::Success => {
            let elapsed = start.elapsed();
            println!(
                "{} Compilation finished in {:.1} minutes",
                "✓".green(),
                elapsed.as_secs_f64() / 60.0
            );
            Ok(CompileOutcome { elapsed })
        }
        ProcessExit::Interrupted => Err(PipelineError::Interrupted),
        other => Err(PipelineError::CompileFailure {
            detail: format!("compiler {}", other.describe()),
        }),
    }
}
