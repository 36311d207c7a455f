//! UI Actor - single-threaded event processing
//!
//! All terminal output during a removal batch is funnelled through one thread.
//! The engine runs on a blocking worker and reports through [`super::Output`];
//! the channel keeps events in send order, so an item's start line is always
//! drawn before its result line.

use super::theme::Theme;
use crossterm::style::Stylize;
use crossterm::{
    QueueableCommand,
    cursor::MoveToColumn,
    terminal::{Clear, ClearType},
};
use std::io::{IsTerminal, Write};
use std::sync::mpsc;
use std::thread;
use winup_schema::OperationStatus;

/// Events that can be sent to the UI actor
#[derive(Debug)]
pub enum UiEvent {
    /// A batch of `total` items is about to start
    PrepareBatch { total: usize },
    /// Print a section header
    PrintHeader { title: String },
    /// An item was dispatched
    Started { index: usize, label: String },
    /// An item reached a terminal status
    Finished {
        index: usize,
        label: String,
        status: OperationStatus,
        message: String,
    },
    /// Items completed so far
    Progress { completed: usize, total: usize },
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// Final tally with timing
    Summary {
        succeeded: usize,
        failed: usize,
        elapsed_secs: f64,
    },
    /// Synchronize UI state (reply once every earlier event is rendered)
    Sync(tokio::sync::oneshot::Sender<()>),
    /// Shutdown the actor
    Shutdown,
}

/// Handle to the UI actor thread
#[derive(Debug)]
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    _handle: thread::JoinHandle<()>,
}

impl UiActor {
    /// Spawn a new UI actor thread
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || {
            let mut renderer = BatchRenderer::new(Theme::default(), std::io::stdout().is_terminal());
            for event in receiver {
                if !renderer.handle(event) {
                    break;
                }
            }
        });

        Self {
            sender,
            _handle: handle,
        }
    }

    /// Get a cloneable sender for this actor
    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        let _ = self.sender.send(UiEvent::Shutdown);
    }
}

/// Line-oriented renderer owned by the actor thread.
struct BatchRenderer {
    theme: Theme,
    /// Live "in progress" lines are only drawn on a terminal.
    live: bool,
    total: usize,
    completed: usize,
}

impl BatchRenderer {
    fn new(theme: Theme, live: bool) -> Self {
        Self {
            theme,
            live,
            total: 0,
            completed: 0,
        }
    }

    fn item_line(&self, index: usize, label: &str, status: OperationStatus, detail: &str) -> String {
        let counter = format!("[{}/{}]", index + 1, self.total.max(index + 1));
        let label = format!("{label:<width$}", width = self.theme.layout.label_width);
        format!(
            "  {} {} {} {}",
            self.theme
                .status_icon(status)
                .with(self.theme.status_color(status)),
            counter.with(self.theme.colors.secondary),
            label.with(self.theme.colors.label),
            detail.with(self.theme.status_color(status))
        )
    }

    /// Returns `false` once the actor should stop.
    fn handle(&mut self, event: UiEvent) -> bool {
        let mut stdout = std::io::stdout();
        match event {
            UiEvent::PrepareBatch { total } => {
                self.total = total;
                self.completed = 0;
                println!();
            }
            UiEvent::PrintHeader { title } => {
                println!();
                println!("{}", title.bold());
            }
            UiEvent::Started { index, label } => {
                if self.live {
                    let line = self.item_line(index, &label, OperationStatus::InProgress, "removing...");
                    let _ = write!(stdout, "{line}");
                    let _ = stdout.flush();
                }
            }
            UiEvent::Finished {
                index,
                label,
                status,
                message,
            } => {
                if self.live {
                    let _ = stdout.queue(MoveToColumn(0));
                    let _ = stdout.queue(Clear(ClearType::CurrentLine));
                }
                let mut lines = message.lines();
                let first = lines.next().unwrap_or_default();
                println!("{}", self.item_line(index, &label, status, first));
                if status == OperationStatus::Failed {
                    for extra in lines.filter(|l| !l.trim().is_empty()) {
                        println!("        {}", extra.trim().with(self.theme.colors.secondary));
                    }
                }
            }
            UiEvent::Progress { completed, total } => {
                self.completed = completed;
                self.total = total;
            }
            UiEvent::Info(msg) => {
                println!("  {} {}", self.theme.icons.info, msg);
            }
            UiEvent::Success(msg) => {
                println!("{} {}", self.theme.icons.success.green(), msg.green());
            }
            UiEvent::Warning(msg) => {
                println!("{} {}", self.theme.icons.warning.yellow(), msg.yellow());
            }
            UiEvent::Error(msg) => {
                println!("{} {}", self.theme.icons.error.red(), msg.red());
            }
            UiEvent::Summary {
                succeeded,
                failed,
                elapsed_secs,
            } => {
                println!();
                let msg = format!(
                    "{succeeded} removed, {failed} failed ({}/{} processed) in {elapsed_secs:.1}s",
                    self.completed, self.total
                );
                if failed == 0 {
                    println!("{} {}", self.theme.icons.success.green(), msg.green());
                } else {
                    println!("{} {}", self.theme.icons.warning.yellow(), msg.yellow());
                }

                // Machine-readable result line for scripts
                let result_json = serde_json::json!({
                    "operation": "remove",
                    "succeeded": succeeded,
                    "failed": failed,
                    "elapsed": elapsed_secs
                });
                println!(
                    "\nRESULT {}",
                    serde_json::to_string(&result_json).unwrap_or_default()
                );
            }
            UiEvent::Sync(tx) => {
                let _ = stdout.flush();
                let _ = tx.send(());
            }
            UiEvent::Shutdown => return false,
        }
        let _ = stdout.flush();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_line_numbers_from_one() {
        let mut renderer = BatchRenderer::new(Theme::default(), false);
        renderer.handle(UiEvent::PrepareBatch { total: 5 });
        let line = renderer.item_line(1, "KB5034441", OperationStatus::Success, "package removed");
        assert!(line.contains("[2/5]"));
        assert!(line.contains("KB5034441"));
        assert!(line.contains("package removed"));
    }

    #[test]
    fn test_sync_replies_after_earlier_events() {
        let actor = UiActor::spawn();
        let sender = actor.sender();
        let (tx, rx) = tokio::sync::oneshot::channel();

        sender.send(UiEvent::Info("test".to_string())).unwrap();
        sender.send(UiEvent::Sync(tx)).unwrap();

        assert!(rx.blocking_recv().is_ok());
        drop(actor);
    }

    #[test]
    fn test_shutdown_stops_the_renderer() {
        let mut renderer = BatchRenderer::new(Theme::default(), false);
        assert!(renderer.handle(UiEvent::Progress {
            completed: 1,
            total: 2
        }));
        assert!(!renderer.handle(UiEvent::Shutdown));
    }
}
