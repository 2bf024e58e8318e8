//! End-to-end pipeline tests
//!
//! These drive the whole pipeline against a temporary project directory with
//! the interpreter, pip and Nuitka replaced by recording fakes.

use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use tixpack::capability::{Capability, ModuleResolver};
use tixpack::clean::{RetryPolicy, Unattended};
use tixpack::compile::{CompileCommand, CompilerRunner};
use tixpack::config::{BuildConfig, PackConfig};
use tixpack::deps::PackageInstaller;
use tixpack::error::PipelineError;
use tixpack::interrupt::InterruptFlag;
use tixpack::pipeline::{Pipeline, Stage};
use tixpack::process::ProcessExit;

struct StaticResolver(Vec<Capability>);

impl ModuleResolver for StaticResolver {
    fn resolves(&self, cap: Capability) -> bool {
        self.0.contains(&cap)
    }
}

#[derive(Clone, Default)]
struct SharedInstaller {
    calls: Rc<RefCell<Vec<Vec<Capability>>>>,
}

impl PackageInstaller for SharedInstaller {
    fn install(&self, packages: &[Capability]) -> Result<(), PipelineError> {
        self.calls.borrow_mut().push(packages.to_vec());
        Ok(())
    }
}

/// Writes a fake standalone build into `<dist>/<output_dir>`.
#[derive(Clone)]
struct FakeNuitka {
    output_dir: String,
    executable: String,
    exit: ProcessExit,
    commands: Rc<RefCell<Vec<CompileCommand>>>,
}

impl FakeNuitka {
    fn new(output_dir: &str) -> Self {
        Self {
            output_dir: output_dir.to_string(),
            executable: "TixQuic_Grabber.exe".to_string(),
            exit: ProcessExit::Success,
            commands: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl CompilerRunner for FakeNuitka {
    fn run(&self, command: &CompileCommand, _cwd: &Path) -> io::Result<ProcessExit> {
        self.commands.borrow_mut().push(command.clone());
        if self.exit.success() {
            let dist = command
                .args
                .iter()
                .find_map(|a| a.strip_prefix("--output-dir="))
                .map(PathBuf::from)
                .expect("output dir flag");
            let out = dist.join(&self.output_dir);
            fs::create_dir_all(out.join("lib"))?;
            fs::write(out.join(&self.executable), vec![0u8; 2048])?;
            fs::write(out.join("lib").join("python3.dll"), vec![1u8; 512])?;
        }
        Ok(self.exit)
    }
}

fn project(with_entry: bool) -> (tempfile::TempDir, BuildConfig) {
    let tmp = tempfile::tempdir().expect("tempdir");
    if with_entry {
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src").join("main.py"), "print('hello')\n").unwrap();
    }
    let config = BuildConfig::from_pack(tmp.path(), &PackConfig::default(), Some("python".into()));
    (tmp, config)
}

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        delay: Duration::ZERO,
    }
}

fn zip_names(path: &Path) -> Vec<String> {
    let zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = zip.file_names().map(String::from).collect();
    names.sort();
    names
}

#[test]
fn test_full_run_produces_archive() {
    let (_tmp, config) = project(true);
    let nuitka = FakeNuitka::new("main.dist");
    let installer = SharedInstaller::default();

    let outcome = Pipeline::new(config.clone())
        .with_resolver(StaticResolver(vec![
            Capability::Requests,
            Capability::Selenium,
            Capability::Tkinter,
        ]))
        .with_installer(installer.clone())
        .with_operator(Unattended)
        .with_compiler(nuitka.clone())
        .with_retry(quick_retry())
        .run();

    assert!(outcome.is_done(), "failure: {:?}", outcome.failure);
    assert_eq!(
        outcome.completed,
        vec![
            Stage::Probing,
            Stage::Installing,
            Stage::Cleaning,
            Stage::Compiling,
            Stage::Locating,
            Stage::Packaging,
        ]
    );

    // openai was missing and got installed before compiling
    assert_eq!(*installer.calls.borrow(), vec![vec![Capability::OpenAi]]);
    let commands = nuitka.commands.borrow();
    assert_eq!(commands.len(), 1);
    assert_eq!(
        commands[0].includes(),
        vec!["tkinter", "requests", "openai", "selenium"]
    );

    assert_eq!(outcome.artifact_dir, Some(config.dist_dir.join("main.dist")));
    let pkg = outcome.package.expect("package report");
    assert_eq!(pkg.archive, config.archive_path);
    assert_eq!(pkg.app_bytes, 2048 + 512);
    assert_eq!(pkg.sha256.len(), 64);

    assert_eq!(
        zip_names(&config.archive_path),
        vec![
            "Launch TixQuic Grabber.bat",
            "TixQuic Grabber User Guide.txt",
            "TixQuic_Grabber/TixQuic_Grabber.exe",
            "TixQuic_Grabber/lib/python3.dll",
        ]
    );

    let guide = fs::read_to_string(config.staging_dir.join("TixQuic Grabber User Guide.txt")).unwrap();
    assert!(guide.contains("GPT-4"));
}

#[test]
fn test_second_run_starts_clean() {
    let (_tmp, config) = project(true);
    fs::create_dir_all(config.staging_dir.join("stale")).unwrap();
    fs::write(config.staging_dir.join("stale").join("old.txt"), "old").unwrap();

    let build = || {
        Pipeline::new(config.clone())
            .with_resolver(StaticResolver(Capability::ALL.to_vec()))
            .with_installer(SharedInstaller::default())
            .with_operator(Unattended)
            .with_compiler(FakeNuitka::new("TixQuic_Grabber.dist"))
            .with_retry(quick_retry())
            .run()
    };

    let first = build();
    assert!(first.is_done(), "failure: {:?}", first.failure);
    let second = build();
    assert!(second.is_done(), "failure: {:?}", second.failure);

    let names = zip_names(&config.archive_path);
    assert!(!names.iter().any(|n| n.starts_with("stale/")));
    assert_eq!(names.len(), 4);
}

#[test]
fn test_missing_browser_library_installs_selenium() {
    let (_tmp, config) = project(true);
    let installer = SharedInstaller::default();
    let outcome = Pipeline::new(config)
        .with_resolver(StaticResolver(vec![Capability::Requests, Capability::OpenAi]))
        .with_installer(installer.clone())
        .with_operator(Unattended)
        .with_compiler(FakeNuitka::new("main.dist"))
        .with_retry(quick_retry())
        .run();

    assert!(outcome.is_done(), "failure: {:?}", outcome.failure);
    assert_eq!(*installer.calls.borrow(), vec![vec![Capability::Selenium]]);
    let report = outcome.report.expect("report");
    assert!(report.has(Capability::Selenium));
    assert!(!report.has(Capability::Playwright));
}

#[test]
fn test_missing_entry_stops_before_compiler() {
    let (_tmp, config) = project(false);
    let nuitka = FakeNuitka::new("main.dist");
    let outcome = Pipeline::new(config)
        .with_resolver(StaticResolver(Capability::ALL.to_vec()))
        .with_installer(SharedInstaller::default())
        .with_operator(Unattended)
        .with_compiler(nuitka.clone())
        .with_retry(quick_retry())
        .run();

    assert_eq!(outcome.state, Stage::Failed);
    assert!(outcome.succeeded(Stage::Cleaning));
    assert!(!outcome.succeeded(Stage::Compiling));
    assert!(matches!(
        outcome.failure,
        Some((Stage::Compiling, PipelineError::CompileMissingSource { .. }))
    ));
    assert!(nuitka.commands.borrow().is_empty());
}

#[test]
fn test_compiler_failure_skips_packaging() {
    let (_tmp, config) = project(true);
    let mut nuitka = FakeNuitka::new("main.dist");
    nuitka.exit = ProcessExit::Failed(Some(1));
    let outcome = Pipeline::new(config.clone())
        .with_resolver(StaticResolver(Capability::ALL.to_vec()))
        .with_installer(SharedInstaller::default())
        .with_operator(Unattended)
        .with_compiler(nuitka)
        .with_retry(quick_retry())
        .run();

    assert!(matches!(
        outcome.failure,
        Some((Stage::Compiling, PipelineError::CompileFailure { .. }))
    ));
    assert!(!config.archive_path.exists());
}

#[test]
fn test_unexpected_output_dir_is_artifact_not_found() {
    let (_tmp, config) = project(true);
    let outcome = Pipeline::new(config)
        .with_resolver(StaticResolver(Capability::ALL.to_vec()))
        .with_installer(SharedInstaller::default())
        .with_operator(Unattended)
        .with_compiler(FakeNuitka::new("somewhere_else.dist"))
        .with_retry(quick_retry())
        .run();

    match outcome.failure {
        Some((Stage::Locating, PipelineError::ArtifactNotFound { searched })) => {
            assert_eq!(searched.len(), 2);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(outcome.package.is_none());
}

#[test]
fn test_failed_install_aborts_before_cleaning() {
    struct FailingInstaller(Rc<Cell<u32>>);
    impl PackageInstaller for FailingInstaller {
        fn install(&self, packages: &[Capability]) -> Result<(), PipelineError> {
            self.0.set(self.0.get() + 1);
            Err(PipelineError::InstallFailure {
                packages: format!("{:?}", packages),
                detail: "pip exit code 1".into(),
            })
        }
    }

    let (_tmp, config) = project(true);
    let calls = Rc::new(Cell::new(0));
    let outcome = Pipeline::new(config.clone())
        .with_resolver(StaticResolver(Vec::new()))
        .with_installer(FailingInstaller(calls.clone()))
        .with_operator(Unattended)
        .with_compiler(FakeNuitka::new("main.dist"))
        .with_retry(quick_retry())
        .run();

    assert_eq!(calls.get(), 1);
    assert_eq!(outcome.completed, vec![Stage::Probing]);
    assert!(matches!(
        outcome.failure,
        Some((Stage::Installing, PipelineError::InstallFailure { .. }))
    ));
    assert!(!config.dist_dir.exists());
}

/// A compiler the operator stops with Ctrl-C; it exits with an ordinary
/// failure code, as Python does after a KeyboardInterrupt.
struct InterruptedNuitka(InterruptFlag);

impl CompilerRunner for InterruptedNuitka {
    fn run(&self, _command: &CompileCommand, _cwd: &Path) -> io::Result<ProcessExit> {
        self.0.raise();
        Ok(ProcessExit::Failed(Some(1)))
    }
}

#[test]
fn test_ctrl_c_during_compile_is_reported_as_interrupt() {
    let (_tmp, config) = project(true);
    let flag = InterruptFlag::new();
    let outcome = Pipeline::new(config.clone())
        .with_resolver(StaticResolver(Capability::ALL.to_vec()))
        .with_installer(SharedInstaller::default())
        .with_operator(Unattended)
        .with_compiler(InterruptedNuitka(flag.clone()))
        .with_retry(quick_retry())
        .with_interrupt(flag)
        .run();

    assert_eq!(outcome.state, Stage::Failed);
    assert!(matches!(
        outcome.failure,
        Some((Stage::Compiling, PipelineError::Interrupted))
    ));
    assert!(!config.archive_path.exists());
}

#[test]
fn test_interrupt_stops_at_next_stage() {
    let (_tmp, config) = project(true);
    let flag = InterruptFlag::new();
    flag.raise();
    let installer = SharedInstaller::default();
    let nuitka = FakeNuitka::new("main.dist");
    let outcome = Pipeline::new(config.clone())
        .with_resolver(StaticResolver(Vec::new()))
        .with_installer(installer.clone())
        .with_operator(Unattended)
        .with_compiler(nuitka.clone())
        .with_retry(quick_retry())
        .with_interrupt(flag)
        .run();

    assert!(outcome.completed.is_empty());
    assert!(matches!(
        outcome.failure,
        Some((Stage::Probing, PipelineError::Interrupted))
    ));
    assert!(installer.calls.borrow().is_empty());
    assert!(nuitka.commands.borrow().is_empty());
    assert!(!config.dist_dir.exists());
}
