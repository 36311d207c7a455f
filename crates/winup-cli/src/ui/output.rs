//! Unified UI output interface.
//!
//! Commands and the removal engine talk to the terminal through [`Output`].
//! Every call becomes an event for the UI actor, which renders them in order.

use super::actor::{UiActor, UiEvent};
use std::sync::{OnceLock, mpsc};
use winup_core::Reporter;
use winup_schema::OperationStatus;

/// Singleton instance of the UI actor channel.
static UI_ACTOR: OnceLock<mpsc::Sender<UiEvent>> = OnceLock::new();

/// Lazily initializes the UI actor and returns a sender handle.
fn get_actor_sender() -> mpsc::Sender<UiEvent> {
    UI_ACTOR
        .get_or_init(|| {
            let actor = UiActor::spawn();
            let sender = actor.sender();

            // Keep actor alive for program duration
            std::mem::forget(actor);

            sender
        })
        .clone()
}

/// A cloneable handle for sending UI events to the terminal actor.
#[derive(Clone, Debug)]
pub struct Output {
    sender: mpsc::Sender<UiEvent>,
    quiet: bool,
}

impl Output {
    /// Create a new output handle.
    pub fn new() -> Self {
        Self {
            sender: get_actor_sender(),
            quiet: false,
        }
    }

    /// Suppress informational messages; warnings, errors and results still show.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn send(&self, event: UiEvent) {
        let _ = self.sender.send(event);
    }

    /// Prints a visual section header.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            self.send(UiEvent::PrintHeader {
                title: title.to_string(),
            });
        }
    }

    /// Prints an informational message to the console.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            self.send(UiEvent::Info(msg.to_string()));
        }
    }

    /// Prints a success message to the console.
    pub fn success(&self, msg: &str) {
        self.send(UiEvent::Success(msg.to_string()));
    }

    /// Prints a warning message to the console.
    pub fn warning(&self, msg: &str) {
        self.send(UiEvent::Warning(msg.to_string()));
    }

    /// Prints an error message to the console.
    pub fn error(&self, msg: &str) {
        self.send(UiEvent::Error(msg.to_string()));
    }

    /// Block until all pending UI events are processed.
    pub fn wait(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(UiEvent::Sync(tx));

        // Block effectively without spinning CPU
        let _ = rx.blocking_recv();
    }

    /// Async version of wait.
    pub async fn wait_async(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(UiEvent::Sync(tx));

        let _ = rx.await;
    }
}

impl Reporter for Output {
    fn section(&self, title: &str) {
        self.section(title);
    }

    fn prepare_batch(&self, labels: &[String]) {
        self.send(UiEvent::PrepareBatch {
            total: labels.len(),
        });
    }

    fn item_started(&self, index: usize, label: &str) {
        self.send(UiEvent::Started {
            index,
            label: label.to_string(),
        });
    }

    fn item_finished(&self, index: usize, label: &str, status: OperationStatus, message: &str) {
        self.send(UiEvent::Finished {
            index,
            label: label.to_string(),
            status,
            message: message.to_string(),
        });
    }

    fn progress(&self, completed: usize, total: usize) {
        self.send(UiEvent::Progress { completed, total });
    }

    fn info(&self, msg: &str) {
        self.info(msg);
    }

    fn success(&self, msg: &str) {
        self.success(msg);
    }

    fn warning(&self, msg: &str) {
        self.warning(msg);
    }

    fn error(&self, msg: &str) {
        self.error(msg);
    }

    fn summary(&self, succeeded: usize, failed: usize, elapsed_secs: f64) {
        self.send(UiEvent::Summary {
            succeeded,
            failed,
            elapsed_secs,
        });
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
