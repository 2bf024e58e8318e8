//! The build-and-package pipeline.
//!
//! ```text
//! Start -> Probing -> Installing -> Cleaning -> Compiling -> Locating -> Packaging -> Done
//!                         any stage failing ---------------------------------------> Failed
//! ```
//!
//! An operator interrupt stops the run at the next stage boundary, and a
//! stage that fails after the interrupt was raised is reported as
//! interrupted rather than as its own failure.
//!
//! Every run starts from scratch; nothing carries over from a previous run
//! except what is on disk, and the cleaning stage wipes that.

use crate::capability::{self, CapabilityReport, ModuleResolver, PythonResolver};
use crate::clean::{self, DirRemover, FsRemover, Operator, PromptOperator, RetryPolicy};
use crate::compile::{self, CompilerRunner, NuitkaRunner};
use crate::config::BuildConfig;
use crate::deps::{self, PackageInstaller, PipInstaller};
use crate::error::PipelineError;
use crate::interrupt::InterruptFlag;
use crate::locate;
use crate::package::{self, PackageReport};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Probing,
    Installing,
    Cleaning,
    Compiling,
    Locating,
    Packaging,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Probing => "probing",
            Stage::Installing => "installing",
            Stage::Cleaning => "cleaning",
            Stage::Compiling => "compiling",
            Stage::Locating => "locating",
            Stage::Packaging => "packaging",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct BuildOutcome {
    /// `Done` or `Failed`.
    pub state: Stage,
    /// Stages that completed, in order.
    pub completed: Vec<Stage>,
    pub report: Option<CapabilityReport>,
    pub compile_time: Option<Duration>,
    pub artifact_dir: Option<PathBuf>,
    pub package: Option<PackageReport>,
    /// The stage that failed and why.
    pub failure: Option<(Stage, PipelineError)>,
}

impl BuildOutcome {
    fn new() -> Self {
        Self {
            state: Stage::Start,
            completed: Vec::new(),
            report: None,
            compile_time: None,
            artifact_dir: None,
            package: None,
            failure: None,
        }
    }

    pub fn succeeded(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    pub fn is_done(&self) -> bool {
        self.state == Stage::Done
    }
}

/// The pipeline and the external collaborators it drives.
pub struct Pipeline {
    config: BuildConfig,
    resolver: Box<dyn ModuleResolver>,
    installer: Box<dyn PackageInstaller>,
    remover: Box<dyn DirRemover>,
    operator: Box<dyn Operator>,
    compiler: Box<dyn CompilerRunner>,
    retry: RetryPolicy,
    interrupt: InterruptFlag,
}

impl Pipeline {
    /// A pipeline wired to the real interpreter, filesystem and terminal.
    pub fn new(config: BuildConfig) -> Self {
        let python = config.python.clone();
        Self {
            config,
            resolver: Box::new(PythonResolver::new(python.clone())),
            installer: Box::new(PipInstaller::new(python)),
            remover: Box::new(FsRemover),
            operator: Box::new(PromptOperator),
            compiler: Box::new(NuitkaRunner),
            retry: RetryPolicy::default(),
            interrupt: InterruptFlag::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_installer(mut self, installer: impl PackageInstaller + 'static) -> Self {
        self.installer = Box::new(installer);
        self
    }

    pub fn with_remover(mut self, remover: impl DirRemover + 'static) -> Self {
        self.remover = Box::new(remover);
        self
    }

    pub fn with_operator(mut self, operator: impl Operator + 'static) -> Self {
        self.operator = Box::new(operator);
        self
    }

    pub fn with_compiler(mut self, compiler: impl CompilerRunner + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Observe `flag` for operator interrupts.
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = flag;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn probe(&self) -> CapabilityReport {
        capability::probe(self.resolver.as_ref())
    }

    /// Remove and recreate the output and staging directories.
    pub fn clean(&self) -> Result<(), PipelineError> {
        clean::prepare_workspace(
            &[self.config.dist_dir.as_path(), self.config.staging_dir.as_path()],
            self.retry,
            self.remover.as_ref(),
            self.operator.as_ref(),
        )
    }

    /// Run every stage in order, stopping at the first failure.
    pub fn run(&self) -> BuildOutcome {
        let mut outcome = BuildOutcome::new();
        if let Err((stage, mut err)) = self.run_stages(&mut outcome) {
            if self.interrupt.is_raised() {
                err = PipelineError::Interrupted;
            }
            tracing::debug!(%stage, error = %err, "pipeline failed");
            outcome.state = Stage::Failed;
            outcome.failure = Some((stage, err));
        } else {
            outcome.state = Stage::Done;
        }
        outcome
    }

    fn run_stages(&self, outcome: &mut BuildOutcome) -> Result<(), (Stage, PipelineError)> {
        let at = |stage: Stage| move |err: PipelineError| (stage, err);

        self.checkpoint(Stage::Probing)?;
        enter(outcome, Stage::Probing);
        let probed = self.probe();
        finish(outcome, Stage::Probing);

        self.checkpoint(Stage::Installing)?;
        enter(outcome, Stage::Installing);
        let report = deps::ensure_dependencies(&probed, self.installer.as_ref())
            .map_err(at(Stage::Installing))?;
        outcome.report = Some(report.clone());
        finish(outcome, Stage::Installing);

        self.checkpoint(Stage::Cleaning)?;
        enter(outcome, Stage::Cleaning);
        self.clean().map_err(at(Stage::Cleaning))?;
        finish(outcome, Stage::Cleaning);

        self.checkpoint(Stage::Compiling)?;
        enter(outcome, Stage::Compiling);
        let compiled = compile::compile(&self.config, &report, self.compiler.as_ref())
            .map_err(at(Stage::Compiling))?;
        outcome.compile_time = Some(compiled.elapsed);
        finish(outcome, Stage::Compiling);

        self.checkpoint(Stage::Locating)?;
        enter(outcome, Stage::Locating);
        let candidates = self.config.artifact_candidates();
        let app_dir = locate::locate_artifact(&candidates, &self.config.app.executable)
            .ok_or(PipelineError::ArtifactNotFound {
                searched: candidates,
            })
            .map_err(at(Stage::Locating))?;
        outcome.artifact_dir = Some(app_dir.clone());
        finish(outcome, Stage::Locating);

        self.checkpoint(Stage::Packaging)?;
        enter(outcome, Stage::Packaging);
        let packaged = package::package(&app_dir, &self.config, &report)
            .map_err(|e| PipelineError::Packaging(format!("{:#}", e)))
            .map_err(at(Stage::Packaging))?;
        outcome.package = Some(packaged);
        finish(outcome, Stage::Packaging);

        Ok(())
    }

    fn checkpoint(&self, next: Stage) -> Result<(), (Stage, PipelineError)> {
        if self.interrupt.is_raised() {
            return Err((next, PipelineError::Interrupted));
        }
        Ok(())
    }
}

fn enter(outcome: &mut BuildOutcome, stage: Stage) {
    tracing::debug!(from = %outcome.state, to = %stage, "stage transition");
    outcome.state = stage;
    println!();
}

fn finish(outcome: &mut BuildOutcome, stage: Stage) {
    outcome.completed.push(stage);
}
