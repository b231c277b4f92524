//! History Module - Append-only wellness log
//!
//! Sits downstream of the engine: consumes published snapshots and alert
//! events, never feeds back into scoring. Records are JSONL with size-based
//! rotation; snapshots are throttled to one per interval, alerts are always
//! written.

pub mod record;
pub mod summary;
pub mod writer;

#[cfg(test)]
mod tests;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::logic::alert::AlertEvent;
use crate::logic::engine::Snapshot;

pub use record::{LogRecord, SnapshotRecord};
pub use summary::{DailySummary, ScoreTally, SnapshotThrottle};
pub use writer::{read_history, HistoryStats, HistoryWriter};

pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024; // 10 MB

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Minimum engine-clock seconds between logged snapshots
    pub snapshot_interval_secs: f64,
    pub max_file_bytes: u64,
    /// Overrides the default data dir
    pub dir: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snapshot_interval_secs: crate::constants::get_snapshot_interval() as f64,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            dir: None,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.snapshot_interval_secs > 0.0) {
            return Err("history: snapshot_interval_secs must be positive".into());
        }
        if self.max_file_bytes == 0 {
            return Err("history: max_file_bytes must be positive".into());
        }
        Ok(())
    }

    pub fn resolve_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(crate::constants::get_history_dir)
    }
}

/// Writer + throttle. Write failures are logged, never surfaced to the tick loop.
pub struct HistoryLog {
    writer: HistoryWriter,
    throttle: SnapshotThrottle,
    dir: PathBuf,
    records: u64,
}

impl HistoryLog {
    pub fn new(config: &HistoryConfig) -> Self {
        Self::from_path(config, config.resolve_dir())
    }

    pub fn from_path(config: &HistoryConfig, dir: PathBuf) -> Self {
        log::info!("History logging to {:?}", dir);
        Self {
            writer: HistoryWriter::from_path(dir.clone(), config.max_file_bytes),
            throttle: SnapshotThrottle::new(config.snapshot_interval_secs),
            dir,
            records: 0,
        }
    }

    /// Log the snapshot if its interval has elapsed, and every event
    pub fn record_tick(&mut self, snapshot: &Snapshot, events: &[AlertEvent]) {
        if self.throttle.should_log(snapshot.timestamp) {
            self.append(&LogRecord::Snapshot(SnapshotRecord::from(snapshot)));
        }
        for event in events {
            self.append(&LogRecord::Alert(event.clone()));
        }
    }

    fn append(&mut self, record: &LogRecord) {
        match self.writer.append(record) {
            Ok(()) => self.records += 1,
            Err(e) => log::error!("Failed to append to history: {}", e),
        }
    }

    /// `summary-YYYY-MM-DD.json` next to the log files
    pub fn write_summary(&self, summary: &DailySummary) -> io::Result<PathBuf> {
        save_summary(summary, &self.dir)
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

pub fn save_summary(summary: &DailySummary, dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("summary-{}.json", summary.date));
    fs::write(&path, serde_json::to_vec_pretty(summary)?)?;
    Ok(path)
}
