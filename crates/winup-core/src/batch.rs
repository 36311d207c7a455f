//! Sequential batch removal.
//!
//! Items run one at a time, in selection order. Every item ends in a terminal
//! status with a message, and one failure never stops the rest of the batch.

use crate::orchestrator::Orchestrator;
use crate::reporter::Reporter;
use std::time::Instant;
use tracing::{info, warn};
use winup_schema::{OperationStatus, UpdateRecord};

/// Final counts of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub succeeded: usize,
    pub failed: usize,
    /// Successful removals that still need a restart.
    pub reboot_required: usize,
}

impl BatchTally {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

pub struct BatchRunner<'a, R: Reporter + ?Sized> {
    orchestrator: &'a Orchestrator,
    reporter: &'a R,
}

impl<'a, R: Reporter + ?Sized> BatchRunner<'a, R> {
    pub fn new(orchestrator: &'a Orchestrator, reporter: &'a R) -> Self {
        Self {
            orchestrator,
            reporter,
        }
    }

    /// Remove every record in `selection`, in order.
    ///
    /// Records are expected to be removable. One that is not is marked
    /// `Skipped`, counted as failed, and never dispatched.
    pub fn run(&self, selection: &mut [UpdateRecord]) -> BatchTally {
        let start = Instant::now();
        let total = selection.len();
        let labels: Vec<String> = selection.iter().map(UpdateRecord::label).collect();

        info!("removing {total} update(s)");
        self.reporter.prepare_batch(&labels);

        let mut tally = BatchTally::default();
        for (index, (record, label)) in selection.iter_mut().zip(&labels).enumerate() {
            if !record.is_removable() {
                warn!("{label}: no removal method, skipped");
                record.set_status(OperationStatus::Skipped, "no removal method resolved");
                self.reporter.item_finished(
                    index,
                    label,
                    OperationStatus::Skipped,
                    record.status_message(),
                );
                tally.failed += 1;
                self.reporter.progress(index + 1, total);
                continue;
            }

            record.set_status(OperationStatus::InProgress, "");
            self.reporter.item_started(index, label);

            let verdict = self.orchestrator.remove(record);

            let status = if verdict.success {
                tally.succeeded += 1;
                if verdict.reboot_required {
                    tally.reboot_required += 1;
                }
                OperationStatus::Success
            } else {
                tally.failed += 1;
                OperationStatus::Failed
            };
            record.set_status(status, verdict.message);
            self.reporter
                .item_finished(index, label, status, record.status_message());
            self.reporter.progress(index + 1, total);
        }

        info!(
            "batch finished: {} succeeded, {} failed",
            tally.succeeded, tally.failed
        );
        self.reporter
            .summary(tally.succeeded, tally.failed, start.elapsed().as_secs_f64());
        tally
    }
}

/// Run a batch with a one-off runner.
pub fn run_batch<R: Reporter + ?Sized>(
    orchestrator: &Orchestrator,
    reporter: &R,
    selection: &mut [UpdateRecord],
) -> BatchTally {
    BatchRunner::new(orchestrator, reporter).run(selection)
}
