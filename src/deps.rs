//! Dependency installation.
//!
//! Makes sure the libraries the app cannot run without are installed, plus
//! at least one browser-control library. Installs go through pip of the
//! configured interpreter.

use crate::capability::{Capability, CapabilityReport};
use crate::error::PipelineError;
use crate::process::{self, ProcessExit};
use colored::*;

/// Libraries that must always be present.
pub const REQUIRED: [Capability; 2] = [Capability::Requests, Capability::OpenAi];

/// Any one of these is enough to drive a browser.
pub const BROWSER_ALTERNATIVES: [Capability; 2] = [Capability::Selenium, Capability::Playwright];

/// Installed when no browser-control library is present.
pub const BROWSER_FALLBACK: Capability = Capability::Selenium;

/// Installs Python packages.
pub trait PackageInstaller {
    fn install(&self, packages: &[Capability]) -> Result<(), PipelineError>;
}

/// `<python> -m pip install <names...>`
pub struct PipInstaller {
    interpreter: String,
}

impl PipInstaller {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    pub fn command_args(packages: &[Capability]) -> Vec<String> {
        let mut args = vec!["-m".to_string(), "pip".to_string(), "install".to_string()];
        args.extend(packages.iter().map(|p| p.module().to_string()));
        args
    }
}

impl PackageInstaller for PipInstaller {
    fn install(&self, packages: &[Capability]) -> Result<(), PipelineError> {
        let args = Self::command_args(packages);
        let exit = process::run_inherited(&self.interpreter, &args, None).map_err(|e| {
            PipelineError::InstallFailure {
                packages: join_names(packages),
                detail: format!("failed to run {}: {}", self.interpreter, e),
            }
        })?;
        match exit {
            ProcessExit::Success => Ok(()),
            ProcessExit::Interrupted => Err(PipelineError::Interrupted),
            other => Err(PipelineError::InstallFailure {
                packages: join_names(packages),
                detail: format!("pip {}", other.describe()),
            }),
        }
    }
}

/// Install whatever is missing and return the updated report.
///
/// With everything already present this performs no installs.
pub fn ensure_dependencies(
    report: &CapabilityReport,
    installer: &dyn PackageInstaller,
) -> Result<CapabilityReport, PipelineError> {
    println!("{} Checking required packages...", "📦".blue());
    let mut current = report.clone();

    let missing: Vec<Capability> = REQUIRED
        .iter()
        .copied()
        .filter(|c| !current.has(*c))
        .collect();

    if !missing.is_empty() {
        println!(
            "   {} Installing required packages: {}",
            "+".green(),
            join_names(&missing)
        );
        installer.install(&missing)?;
        current = current.with_installed(&missing);
        println!("   {} Required packages installed", "✓".green());
    }

    if !BROWSER_ALTERNATIVES.iter().any(|c| current.has(*c)) {
        println!(
            "   {} Installing browser-control package: {}",
            "+".green(),
            BROWSER_FALLBACK
        );
        installer.install(&[BROWSER_FALLBACK])?;
        current = current.with_installed(&[BROWSER_FALLBACK]);
        println!("   {} {} installed", "✓".green(), BROWSER_FALLBACK);
    }

    if current == *report {
        println!("   {} All required packages present", "✓".green());
    }
    Ok(current)
}

fn join_names(packages: &[Capability]) -> String {
    packages
        .iter()
        .map(|p| p.module())
        .collect::<Vec<_>>()
        .join(", ")
}
