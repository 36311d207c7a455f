pub mod batch;
pub mod drivers;
pub mod exec;
pub mod history;
pub mod matcher;
pub mod orchestrator;
pub mod parse;
pub mod paths;
pub mod process;
pub mod refresh;
pub mod sources;

pub mod reporter;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{BatchRunner, BatchTally, run_batch};
pub use exec::{ExecError, ExecOutput, Executors, Invocation, RemovalExecutor};
pub use matcher::{IdentityMatcher, MatchLog};
pub use orchestrator::{Orchestrator, Verdict};
pub use paths::*;
pub use refresh::{Scan, Sources};
pub use reporter::{NullReporter, Reporter};

/// Default bound on a standalone installer run (five minutes).
pub const DEFAULT_STANDALONE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);
