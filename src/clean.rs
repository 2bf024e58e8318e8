//! Workspace cleanup.
//!
//! Removes the compiler output and staging directories and recreates them
//! empty. On Windows a running copy of the app or an open explorer window
//! keeps files locked, so removal is retried a few times and then escalated
//! to the operator before one last attempt.
//!
//! ```text
//! Attempting(1) -> Waiting(1) -> Attempting(2) -> ... -> Attempting(n)
//!   -> AwaitingOperator -> FinalAttempt -> Done | Failed
//! ```

use crate::error::{self, PipelineError};
use colored::*;
use inquire::InquireError;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Automatic attempts before asking the operator.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

pub trait DirRemover {
    fn remove(&self, path: &Path) -> io::Result<()>;
}

pub struct FsRemover;

impl DirRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

/// Source of operator acknowledgment for the final removal attempt.
pub trait Operator {
    /// `Ok(true)` once the operator says the retry may go ahead,
    /// `Ok(false)` if they decline.
    fn acknowledge(&self, path: &Path, err: &io::Error) -> Result<bool, PipelineError>;
}

/// Asks on the terminal.
pub struct PromptOperator;

impl Operator for PromptOperator {
    fn acknowledge(&self, path: &Path, _err: &io::Error) -> Result<bool, PipelineError> {
        inquire::Confirm::new(&format!("Retry removing {} now?", path.display()))
            .with_default(true)
            .with_help_message("Close the programs listed above first")
            .prompt()
            .map_err(|e| match e {
                InquireError::OperationInterrupted | InquireError::OperationCanceled => {
                    PipelineError::Interrupted
                }
                other => PipelineError::CleanupLocked {
                    path: path.to_path_buf(),
                    source: io::Error::other(other.to_string()),
                },
            })
    }
}

/// For unattended runs: never acknowledges, so a locked directory fails the run.
pub struct Unattended;

impl Operator for Unattended {
    fn acknowledge(&self, _path: &Path, _err: &io::Error) -> Result<bool, PipelineError> {
        Ok(false)
    }
}

#[derive(Debug)]
enum Removal {
    Attempting(u32),
    Waiting(u32),
    AwaitingOperator(io::Error),
    FinalAttempt,
    Done,
    Failed(io::Error),
}

/// What it took to remove a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemovalReport {
    /// Removal calls made, including the final one.
    pub attempts: u32,
    pub escalated: bool,
}

/// Remove `path` following `policy`, escalating to `operator` when the
/// automatic attempts are used up.
pub fn remove_with_retry(
    path: &Path,
    policy: RetryPolicy,
    remover: &dyn DirRemover,
    operator: &dyn Operator,
) -> Result<RemovalReport, PipelineError> {
    let mut report = RemovalReport::default();
    let mut state = Removal::Attempting(1);

    loop {
        tracing::debug!(path = %path.display(), state = ?state, "removal");
        state = match state {
            Removal::Attempting(n) => {
                report.attempts += 1;
                match remover.remove(path) {
                    Ok(()) => Removal::Done,
                    Err(e) if n < policy.attempts.max(1) => {
                        println!(
                            "   {} Attempt {} to remove {} failed, retrying in {:?}...",
                            "!".yellow(),
                            n,
                            path.display(),
                            policy.delay
                        );
                        tracing::debug!(error = %e, "removal attempt failed");
                        Removal::Waiting(n)
                    }
                    Err(e) => Removal::AwaitingOperator(e),
                }
            }
            Removal::Waiting(n) => {
                std::thread::sleep(policy.delay);
                Removal::Attempting(n + 1)
            }
            Removal::AwaitingOperator(err) => {
                report.escalated = true;
                println!("{} Cannot remove {}", "x".red(), path.display());
                println!("   Error: {}", err);
                println!("\n{} Please do the following:", "💡".yellow());
                for (i, hint) in error::cleanup_hints().iter().enumerate() {
                    println!("   {}. {}", i + 1, hint);
                }
                if operator.acknowledge(path, &err)? {
                    Removal::FinalAttempt
                } else {
                    Removal::Failed(err)
                }
            }
            Removal::FinalAttempt => {
                report.attempts += 1;
                match remover.remove(path) {
                    Ok(()) => Removal::Done,
                    Err(e) => Removal::Failed(e),
                }
            }
            Removal::Done => return Ok(report),
            Removal::Failed(source) => {
                return Err(PipelineError::CleanupLocked {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
    }
}

/// Remove (if present) and recreate each directory in order.
///
/// Stops at the first directory that cannot be removed.
pub fn prepare_workspace(
    dirs: &[&Path],
    policy: RetryPolicy,
    remover: &dyn DirRemover,
    operator: &dyn Operator,
) -> Result<(), PipelineError> {
    println!("{} Cleaning old output...", "🧹".cyan());
    for dir in dirs {
        if dir.exists() {
            remove_with_retry(dir, policy, remover, operator)?;
            println!("   {} Removed {}", "🗑️".red(), dir.display());
        }
        fs::create_dir_all(dir).map_err(|source| PipelineError::CleanupLocked {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    println!("{} Workspace ready", "✓".green());
    Ok(())
}
