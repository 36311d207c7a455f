//! Reporter trait for dependency injection
//!
//! The removal engine reports per-item status and progress through this
//! trait so it never depends on a particular terminal or GUI front end.

use winup_schema::OperationStatus;

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Scanning", "Removing").
    fn section(&self, title: &str);

    /// Reserve one display row per batch item, in dispatch order.
    fn prepare_batch(&self, labels: &[String]);

    /// An item has been dispatched and is now `InProgress`.
    fn item_started(&self, index: usize, label: &str);

    /// An item reached a terminal status.
    fn item_finished(&self, index: usize, label: &str, status: OperationStatus, message: &str);

    /// Number of items completed out of the batch total.
    fn progress(&self, completed: usize, total: usize);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);

    /// Display the final tally of a batch.
    fn summary(&self, succeeded: usize, failed: usize, elapsed_secs: f64);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title)
    }
    fn prepare_batch(&self, labels: &[String]) {
        (**self).prepare_batch(labels)
    }
    fn item_started(&self, index: usize, label: &str) {
        (**self).item_started(index, label)
    }
    fn item_finished(&self, index: usize, label: &str, status: OperationStatus, message: &str) {
        (**self).item_finished(index, label, status, message)
    }
    fn progress(&self, completed: usize, total: usize) {
        (**self).progress(completed, total)
    }
    fn info(&self, msg: &str) {
        (**self).info(msg)
    }
    fn success(&self, msg: &str) {
        (**self).success(msg)
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg)
    }
    fn error(&self, msg: &str) {
        (**self).error(msg)
    }
    fn summary(&self, succeeded: usize, failed: usize, elapsed_secs: f64) {
        (**self).summary(succeeded, failed, elapsed_secs)
    }
}

/// A no-op reporter for silent operations (e.g., scripted runs, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn prepare_batch(&self, _: &[String]) {}
    fn item_started(&self, _: usize, _: &str) {}
    fn item_finished(&self, _: usize, _: &str, _: OperationStatus, _: &str) {}
    fn progress(&self, _: usize, _: usize) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, _: usize, _: usize, _: f64) {}
}
