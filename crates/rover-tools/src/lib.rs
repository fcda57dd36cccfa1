//! Observability for action queues: completion sinks and logging setup.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod jsonl;
pub mod logging;
pub mod record;

pub use jsonl::{read_records, JsonLinesSink};
pub use record::{CompletionLog, CompletionRecord, CompletionRecorder, TracingSink};
