//! Removal executor seam.
//!
//! An executor runs one native removal tool against one target and reports
//! what happened. It never interprets exit codes; that is the orchestrator's
//! job.

use std::sync::Arc;
use std::time::Duration;

/// A single removal request handed to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Package identity, inf name or KB identifier.
    pub target: String,
    /// Upper bound on the run; `None` waits for the tool to finish.
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Exit code and captured output of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    /// Standard output followed by standard error.
    pub output: String,
}

impl ExecOutput {
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }
}

/// A run that did not produce an exit code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("could not start {tool}: {reason}")]
    Spawn { tool: String, reason: String },

    #[error("I/O error while running {tool}: {reason}")]
    Io { tool: String, reason: String },

    #[error("timed out after {}s; the process was terminated", .0.as_secs())]
    Timeout(Duration),
}

/// Runs one native removal tool.
pub trait RemovalExecutor: Send + Sync {
    /// Tool name for messages, e.g. `DISM`.
    fn tool(&self) -> &str;

    fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, ExecError>;
}

impl<T: RemovalExecutor + ?Sized> RemovalExecutor for Arc<T> {
    fn tool(&self) -> &str {
        (**self).tool()
    }
    fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, ExecError> {
        (**self).execute(invocation)
    }
}

/// One executor per removal mechanism.
#[derive(Clone)]
pub struct Executors {
    pub package_manager: Arc<dyn RemovalExecutor>,
    pub driver_tool: Arc<dyn RemovalExecutor>,
    pub standalone: Arc<dyn RemovalExecutor>,
}

impl std::fmt::Debug for Executors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executors")
            .field("package_manager", &self.package_manager.tool())
            .field("driver_tool", &self.driver_tool.tool())
            .field("standalone", &self.standalone.tool())
            .finish()
    }
}
