use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use rover_core::{CompletionEvent, CompletionSink, ResultCategory};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A completion stamped with wall-clock time and the robot it happened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub timestamp: DateTime<Utc>,
    pub robot: Option<u64>,
    pub event: CompletionEvent,
}

impl CompletionRecord {
    pub fn now(robot: Option<u64>, event: CompletionEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            robot,
            event,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLog {
    pub events: Vec<CompletionEvent>,
}

impl CompletionLog {
    pub fn push(&mut self, event: CompletionEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn count(&self, category: ResultCategory) -> usize {
        self.events
            .iter()
            .filter(|event| event.category() == category)
            .count()
    }

    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(|event| event.name.as_str()).collect()
    }
}

/// Collects completions in memory. Hand [`CompletionRecorder::sink`] to a queue and read the
/// log back through the recorder.
#[derive(Debug, Default, Clone)]
pub struct CompletionRecorder {
    log: Rc<RefCell<CompletionLog>>,
}

impl CompletionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> Box<dyn CompletionSink> {
        let log = Rc::clone(&self.log);
        Box::new(move |event: &CompletionEvent| log.borrow_mut().push(event.clone()))
    }

    pub fn snapshot(&self) -> CompletionLog {
        self.log.borrow().clone()
    }

    pub fn take(&self) -> CompletionLog {
        std::mem::take(&mut *self.log.borrow_mut())
    }
}

/// Logs every completion through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink {
    pub robot: Option<u64>,
}

impl CompletionSink for TracingSink {
    fn on_completion(&mut self, event: &CompletionEvent) {
        info!(
            robot = self.robot,
            tag = %event.tag,
            name = %event.name,
            kind = %event.kind,
            outcome = %event.outcome,
            category = ?event.category(),
            tick = event.tick,
            "Action completion"
        );
    }
}
