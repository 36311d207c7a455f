//! Child-process plumbing shared by the removal executors and the inventory
//! queries.

use crate::exec::{ExecError, ExecOutput, Invocation, RemovalExecutor};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use wait_timeout::ChildExt;

fn drain(mut pipe: impl Read + Send + 'static) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn combine(stdout: String, stderr: &str) -> String {
    if stderr.trim().is_empty() {
        stdout
    } else {
        format!("{stdout}\n{stderr}")
    }
}

/// Spawn `program` with `args`, wait (optionally bounded) and capture both
/// streams.
///
/// # Errors
///
/// `Spawn` when the program cannot be started, `Io` when waiting fails and
/// `Timeout` when the bound elapses; the child is killed in that case.
pub fn run_tool(
    tool: &str,
    program: &Path,
    args: &[String],
    timeout: Option<Duration>,
) -> Result<ExecOutput, ExecError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExecError::Spawn {
            tool: tool.to_string(),
            reason: e.to_string(),
        })?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let io_err = |e: std::io::Error| ExecError::Io {
        tool: tool.to_string(),
        reason: e.to_string(),
    };

    let status = match timeout {
        Some(limit) => match child.wait_timeout(limit).map_err(io_err)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ExecError::Timeout(limit));
            }
        },
        None => child.wait().map_err(io_err)?,
    };

    let output = combine(collect(stdout), &collect(stderr));
    // A signal-terminated child has no code; report it as a generic failure.
    Ok(ExecOutput::new(status.code().unwrap_or(-1), output))
}

/// Builds the argument list for one target.
pub type ArgBuilder = fn(&str) -> Vec<String>;

/// A removal executor backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    tool: String,
    program: PathBuf,
    args: ArgBuilder,
}

impl CommandExecutor {
    pub fn new(tool: impl Into<String>, program: impl Into<PathBuf>, args: ArgBuilder) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args,
        }
    }

    /// Arguments that would be passed for `target`, for dry runs.
    pub fn command_line(&self, target: &str) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend((self.args)(target));
        parts.join(" ")
    }
}

impl RemovalExecutor for CommandExecutor {
    fn tool(&self) -> &str {
        &self.tool
    }

    fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, ExecError> {
        let args = (self.args)(&invocation.target);
        run_tool(&self.tool, &self.program, &args, invocation.timeout)
    }
}

/// `dism /Online /Remove-Package /PackageName:<identity> /Quiet /NoRestart`
pub fn dism_remove_args(identity: &str) -> Vec<String> {
    vec![
        "/Online".into(),
        "/Remove-Package".into(),
        format!("/PackageName:{identity}"),
        "/Quiet".into(),
        "/NoRestart".into(),
    ]
}

/// `pnputil /delete-driver <inf> /uninstall /force`
pub fn pnputil_delete_args(inf_name: &str) -> Vec<String> {
    vec![
        "/delete-driver".into(),
        inf_name.into(),
        "/uninstall".into(),
        "/force".into(),
    ]
}

/// `wusa /uninstall /kb:<number> /quiet /norestart`
pub fn wusa_uninstall_args(kb: &str) -> Vec<String> {
    let number = kb
        .get(..2)
        .filter(|p| p.eq_ignore_ascii_case("kb"))
        .map_or(kb, |_| &kb[2..]);
    vec![
        "/uninstall".into(),
        format!("/kb:{number}"),
        "/quiet".into(),
        "/norestart".into(),
    ]
}
