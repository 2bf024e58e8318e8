//! Pipeline error taxonomy.
//!
//! Every fatal condition the pipeline can hit maps to one variant here. A
//! capability that fails to resolve is not an error: the prober records it as
//! absent and moves on.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// pip could not be started or exited non-zero.
    #[error("required dependency installation failed ({packages}): {detail}")]
    InstallFailure { packages: String, detail: String },

    /// An output directory survived every removal attempt.
    #[error("could not remove {}: {source}", path.display())]
    CleanupLocked {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry script does not exist; nothing was compiled.
    #[error("entry source file not found: {}", path.display())]
    CompileMissingSource { path: PathBuf },

    /// Nuitka could not be started or exited non-zero.
    #[error("compilation failed: {detail}")]
    CompileFailure { detail: String },

    /// No candidate output directory holds the executable.
    #[error("compiled executable not found (searched {})", format_paths(searched))]
    ArtifactNotFound { searched: Vec<PathBuf> },

    /// Copying, document writing or archiving failed.
    #[error("packaging failed: {0}")]
    Packaging(String),

    /// The operator pressed Ctrl-C or cancelled a prompt.
    #[error("build interrupted by operator")]
    Interrupted,
}

impl PipelineError {
    /// Remediation lines shown under the error message.
    pub fn hints(&self) -> Vec<String> {
        match self {
            PipelineError::InstallFailure { .. } => vec![
                "Check your network connection and package index access".to_string(),
                "Try installing the packages manually with pip".to_string(),
            ],
            PipelineError::CleanupLocked { .. } => cleanup_hints(),
            PipelineError::CompileMissingSource { .. } => vec![
                "Run tixpack from the project root or pass --root".to_string(),
                "Check [app].entry and [paths].source in tixpack.toml".to_string(),
            ],
            PipelineError::CompileFailure { .. } => vec![
                "Make sure nuitka is installed: pip install nuitka".to_string(),
                "Make sure all required packages are installed".to_string(),
                "Try restarting your terminal".to_string(),
            ],
            PipelineError::ArtifactNotFound { .. } => vec![
                "Check the compiler output above for warnings".to_string(),
                "Check [app].executable in tixpack.toml".to_string(),
            ],
            PipelineError::Packaging(_) => vec![
                "Make sure the project directory is writable".to_string(),
            ],
            PipelineError::Interrupted => Vec::new(),
        }
    }

    pub fn is_interrupt(&self) -> bool {
        matches!(self, PipelineError::Interrupted)
    }
}

/// What the operator should close before a locked directory can be removed.
pub fn cleanup_hints() -> Vec<String> {
    vec![
        "Close any file explorer windows showing the output folders".to_string(),
        "Close any running copy of the packaged executable".to_string(),
        "Close editors or IDEs that have the folders open".to_string(),
    ]
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
