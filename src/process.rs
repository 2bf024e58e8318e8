//! Child process helpers shared by the prober, installer and compiler.

use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// How an external tool finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    Success,
    /// Non-zero exit; `None` when no code was reported.
    Failed(Option<i32>),
    /// Killed by a signal (operator interrupt on Unix).
    Interrupted,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        matches!(self, ProcessExit::Success)
    }

    pub fn describe(&self) -> String {
        match self {
            ProcessExit::Success => "exit code 0".to_string(),
            ProcessExit::Failed(Some(code)) => format!("exit code {}", code),
            ProcessExit::Failed(None) => "terminated without an exit code".to_string(),
            ProcessExit::Interrupted => "terminated by signal".to_string(),
        }
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            return ProcessExit::Success;
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if status.signal().is_some() {
                return ProcessExit::Interrupted;
            }
        }
        ProcessExit::Failed(status.code())
    }
}

/// Run `program args...` with inherited stdio and wait for it.
pub fn run_inherited(program: &str, args: &[String], cwd: Option<&Path>) -> io::Result<ProcessExit> {
    tracing::debug!(program, ?args, "spawning");
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let status = cmd.status()?;
    Ok(status.into())
}

/// Run `program args...` with all output discarded.
pub fn run_quiet(program: &str, args: &[&str]) -> io::Result<ProcessExit> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    Ok(status.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(ProcessExit::Failed(Some(2)).describe(), "exit code 2");
        assert!(!ProcessExit::Interrupted.success());
        assert!(ProcessExit::Success.success());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let result = run_quiet("tixpack-definitely-not-a-real-program", &[]);
        assert!(result.is_err());
    }
}
