use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rover_core::{CompletionEvent, CompletionSink};
use tracing::warn;

use crate::CompletionRecord;

/// Appends each completion to a JSON-lines file.
pub struct JsonLinesSink {
    path: PathBuf,
    file: File,
    robot: Option<u64>,
    failures: u64,
}

impl JsonLinesSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        Ok(Self {
            path,
            file,
            robot: None,
            failures: 0,
        })
    }

    pub fn for_robot(mut self, robot: u64) -> Self {
        self.robot = Some(robot);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Completions that could not be written.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn write(&mut self, event: &CompletionEvent) -> Result<()> {
        let record = CompletionRecord::now(self.robot, event.clone());
        let line = serde_json::to_string(&record)?;
        writeln!(self.file, "{line}")?;
        Ok(())
    }
}

impl CompletionSink for JsonLinesSink {
    fn on_completion(&mut self, event: &CompletionEvent) {
        if let Err(err) = self.write(event) {
            self.failures += 1;
            warn!(path = %self.path.display(), error = %err, "Failed to record completion");
        }
    }
}

/// Reads the last `limit` records from a JSON-lines file, skipping lines that do not parse.
pub fn read_records(path: impl AsRef<Path>, limit: usize) -> Vec<CompletionRecord> {
    let Ok(file) = File::open(path.as_ref()) else {
        return Vec::new();
    };
    let mut records: Vec<CompletionRecord> = BufReader::new(file)
        .lines()
        .map_while(|line| line.ok())
        .filter_map(|line| serde_json::from_str(&line).ok())
        .collect();
    if records.len() > limit {
        records.drain(0..records.len() - limit);
    }
    records
}
