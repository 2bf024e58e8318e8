//! # tixpack - download package builder for TixQuic Grabber
//!
//! tixpack turns the Python sources of the TixQuic Grabber desktop app into a
//! zip that can be published on the website: one standalone executable
//! directory, a launcher script and a user guide.
//!
//! ## Pipeline
//!
//! 1. Probe which optional Python libraries are installed
//! 2. Install the required ones that are missing (pip)
//! 3. Wipe and recreate `dist/` and `website_download/`
//! 4. Compile `src/main.py` with Nuitka in standalone mode
//! 5. Find the compiled app directory
//! 6. Stage it with the generated documents and zip the staging directory
//!
//! ## Module Organization
//!
//! - [`pipeline`] - Stage sequencing and the build outcome
//! - [`capability`] - Optional library detection
//! - [`config`] - `tixpack.toml` and resolved paths

/// Optional library detection.
pub mod capability;

/// Workspace cleanup with bounded retry and operator escalation.
pub mod clean;

/// Nuitka command construction and invocation.
pub mod compile;

/// Configuration file parsing (`tixpack.toml`).
pub mod config;

/// Required package installation.
pub mod deps;

/// Pipeline error taxonomy.
pub mod error;

/// Ctrl-C tracking.
pub mod interrupt;

/// Compiled artifact lookup.
pub mod locate;

/// Staging and zip archive creation.
pub mod package;

/// Stage sequencing.
pub mod pipeline;

/// Child process helpers.
pub mod process;

/// Launcher and guide text.
pub mod templates;

/// Terminal UI utilities (tables, pauses, sizes).
pub mod ui;
