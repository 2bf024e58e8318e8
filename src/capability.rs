//! Capability probing.
//!
//! A capability is an optional Python library whose presence changes what the
//! compiler bundles and what the generated launcher and guide say. Probing
//! never fails: anything that goes wrong while resolving a module is recorded
//! as "absent".

use crate::process::{self, ProcessExit};
use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Requests,
    OpenAi,
    Selenium,
    Playwright,
    Tkinter,
}

impl Capability {
    /// Probe order.
    pub const ALL: [Capability; 5] = [
        Capability::Requests,
        Capability::OpenAi,
        Capability::Selenium,
        Capability::Playwright,
        Capability::Tkinter,
    ];

    /// Python module name.
    pub fn module(&self) -> &'static str {
        match self {
            Capability::Requests => "requests",
            Capability::OpenAi => "openai",
            Capability::Selenium => "selenium",
            Capability::Playwright => "playwright",
            Capability::Tkinter => "tkinter",
        }
    }

    /// `tkinter` ships with the interpreter rather than as a pip package.
    pub fn is_builtin(&self) -> bool {
        matches!(self, Capability::Tkinter)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module())
    }
}

/// Presence of every [`Capability`] in the target environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CapabilityReport {
    present: BTreeMap<Capability, bool>,
}

impl Default for CapabilityReport {
    fn default() -> Self {
        Self {
            present: Capability::ALL.iter().map(|c| (*c, false)).collect(),
        }
    }
}

impl CapabilityReport {
    pub fn from_pairs(pairs: &[(Capability, bool)]) -> Self {
        let mut report = Self::default();
        for (cap, present) in pairs {
            report.present.insert(*cap, *present);
        }
        report
    }

    pub fn has(&self, cap: Capability) -> bool {
        self.present.get(&cap).copied().unwrap_or(false)
    }

    /// A new report with `installed` marked present.
    pub fn with_installed(&self, installed: &[Capability]) -> Self {
        let mut next = self.clone();
        for cap in installed {
            next.present.insert(*cap, true);
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, bool)> + '_ {
        self.present.iter().map(|(c, p)| (*c, *p))
    }
}

/// Resolves a Python module in some environment.
pub trait ModuleResolver {
    fn resolves(&self, cap: Capability) -> bool;
}

/// Asks a Python interpreter whether each module is importable.
pub struct PythonResolver {
    interpreter: String,
}

impl PythonResolver {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    fn probe_script(cap: Capability) -> String {
        if cap.is_builtin() {
            format!("import {}", cap.module())
        } else {
            format!(
                "import importlib.util, sys; sys.exit(0 if importlib.util.find_spec('{}') else 1)",
                cap.module()
            )
        }
    }
}

impl ModuleResolver for PythonResolver {
    fn resolves(&self, cap: Capability) -> bool {
        let script = Self::probe_script(cap);
        match process::run_quiet(&self.interpreter, &["-c", &script]) {
            Ok(exit) => exit == ProcessExit::Success,
            Err(e) => {
                tracing::debug!(module = cap.module(), error = %e, "probe could not run interpreter");
                false
            }
        }
    }
}

/// Resolve every capability without printing anything.
pub fn resolve_all(resolver: &dyn ModuleResolver) -> CapabilityReport {
    let mut report = CapabilityReport::default();
    for cap in Capability::ALL {
        let present = resolver.resolves(cap);
        tracing::debug!(module = cap.module(), present, "probed");
        report.present.insert(cap, present);
    }
    report
}

/// Probe every capability, printing one line per module.
pub fn probe(resolver: &dyn ModuleResolver) -> CapabilityReport {
    println!("{} Detecting installed packages...", "🔍".cyan());
    let report = resolve_all(resolver);
    for (cap, present) in report.iter() {
        if present {
            println!("   {} {}", "✓".green(), cap);
        } else {
            println!("   {} {} {}", "x".red(), cap, "(not installed)".dimmed());
        }
    }
    report
}
