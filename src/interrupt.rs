//! Operator interrupt (Ctrl-C) tracking.
//!
//! Ctrl-C in a terminal reaches the whole foreground process group, so pip
//! or Nuitka die on their own while this process keeps running and reports
//! the interrupt. A second Ctrl-C exits immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit status used when a second Ctrl-C forces an exit.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Shared flag raised when the operator asks to stop.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the run as interrupted. Returns whether it already was.
    pub fn raise(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Route Ctrl-C to this flag instead of terminating the process.
    ///
    /// Can only be installed once per process.
    pub fn install_handler(&self) -> Result<(), ctrlc::Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            if flag.raise() {
                std::process::exit(FORCED_EXIT_CODE);
            }
            tracing::debug!("interrupt requested");
        })
    }
}
