//! In-memory doubles shared by the unit tests.

use crate::exec::{ExecError, ExecOutput, Invocation, RemovalExecutor};
use crate::reporter::Reporter;
use std::collections::HashMap;
use std::sync::Mutex;
use winup_schema::OperationStatus;

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Exit(i32, &'static str),
    Fail(ExecError),
    Panic(&'static str),
}

/// Executor that replays a canned step per target and records every call.
pub(crate) struct ScriptedExecutor {
    tool: &'static str,
    fallback: Step,
    script: HashMap<String, Step>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    pub(crate) fn new(tool: &'static str) -> Self {
        Self {
            tool,
            fallback: Step::Exit(0, "The operation completed successfully."),
            script: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on(mut self, target: &str, step: Step) -> Self {
        self.script.insert(target.to_string(), step);
        self
    }

    pub(crate) fn otherwise(mut self, step: Step) -> Self {
        self.fallback = step;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn targets(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.target).collect()
    }
}

impl RemovalExecutor for ScriptedExecutor {
    fn tool(&self) -> &str {
        self.tool
    }

    fn execute(&self, invocation: &Invocation) -> Result<ExecOutput, ExecError> {
        self.calls.lock().unwrap().push(invocation.clone());
        match self.script.get(&invocation.target).unwrap_or(&self.fallback) {
            Step::Exit(code, output) => Ok(ExecOutput::new(*code, *output)),
            Step::Fail(err) => Err(err.clone()),
            Step::Panic(msg) => panic!("{msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Prepared(usize),
    Started(usize),
    Finished(usize, OperationStatus),
    Progress(usize, usize),
    Summary(usize, usize),
}

/// Reporter that keeps the batch events in arrival order.
#[derive(Default)]
pub(crate) struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn section(&self, _: &str) {}
    fn prepare_batch(&self, labels: &[String]) {
        self.push(Event::Prepared(labels.len()));
    }
    fn item_started(&self, index: usize, _: &str) {
        self.push(Event::Started(index));
    }
    fn item_finished(&self, index: usize, _: &str, status: OperationStatus, _: &str) {
        self.push(Event::Finished(index, status));
    }
    fn progress(&self, completed: usize, total: usize) {
        self.push(Event::Progress(completed, total));
    }
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
    fn summary(&self, succeeded: usize, failed: usize, _: f64) {
        self.push(Event::Summary(succeeded, failed));
    }
}
