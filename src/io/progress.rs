//! Progress side channel: a `{processed, total}` counter and where it is published.
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    pub processed: u64,
    pub total: u64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub done: bool,
}

/// Receives every progress update of a job.
pub trait ProgressSink {
    fn publish(&mut self, state: &ProgressState);
}

/// Discards updates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn publish(&mut self, _state: &ProgressState) {}
}

impl<F: FnMut(&ProgressState)> ProgressSink for F {
    fn publish(&mut self, state: &ProgressState) {
        self(state)
    }
}

/// Mirrors progress into a JSON file that other processes can poll.
///
/// Each update replaces the file atomically, so readers never observe a
/// partially written document.
#[derive(Debug, Clone)]
pub struct JsonProgressFile {
    path: PathBuf,
}

impl JsonProgressFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, state: &ProgressState) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, state)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl ProgressSink for JsonProgressFile {
    fn publish(&mut self, state: &ProgressState) {
        if let Err(e) = self.write(state) {
            warn!("Failed to write progress file {:?}: {}", self.path, e);
        }
    }
}

/// Counter threaded through every stage of a job.
///
/// `processed` never decreases and never exceeds `total`.
pub struct ProgressTracker<'a> {
    state: ProgressState,
    sink: &'a mut dyn ProgressSink,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            state: ProgressState::default(),
            sink,
        }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    /// Grow the expected amount of work.
    pub fn add_total(&mut self, amount: u64) {
        self.state.total += amount;
        self.sink.publish(&self.state);
    }

    /// Record one finished unit of work.
    pub fn step(&mut self) {
        self.advance(1);
    }

    pub fn advance(&mut self, amount: u64) {
        self.state.processed = (self.state.processed + amount).min(self.state.total);
        self.sink.publish(&self.state);
    }

    /// Mark the job complete.
    pub fn finish(&mut self) {
        self.state.processed = self.state.total;
        self.state.done = true;
        self.sink.publish(&self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_is_clamped_and_monotonic() {
        let mut seen = Vec::new();
        let mut sink = |s: &ProgressState| seen.push(*s);
        let mut tracker = ProgressTracker::new(&mut sink);
        tracker.add_total(2);
        tracker.step();
        tracker.step();
        tracker.step();
        tracker.add_total(1);
        tracker.finish();
        drop(tracker);

        let processed: Vec<u64> = seen.iter().map(|s| s.processed).collect();
        assert_eq!(processed, vec![0, 1, 2, 2, 2, 3]);
        assert!(seen.iter().all(|s| s.processed <= s.total));
        assert!(seen.last().unwrap().done);
    }

    #[test]
    fn json_file_reflects_latest_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        let mut file = JsonProgressFile::new(&path);
        file.publish(&ProgressState {
            processed: 3,
            total: 7,
            done: false,
        });
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, r#"{"processed":3,"total":7}"#);

        file.publish(&ProgressState {
            processed: 7,
            total: 7,
            done: true,
        });
        let state: ProgressState =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(state.done);
        assert_eq!(state.processed, 7);
    }
}
