use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;

use super::record::LogRecord;

const FILE_PREFIX: &str = "history-";

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub files: usize,
    pub total_bytes: u64,
    pub current_file: Option<String>,
}

pub struct HistoryWriter {
    file: Mutex<Option<File>>,
    base_dir: PathBuf,
    max_file_bytes: u64,
}

impl HistoryWriter {
    pub fn from_path(base_dir: PathBuf, max_file_bytes: u64) -> Self {
        if let Err(e) = fs::create_dir_all(&base_dir) {
            log::warn!("Failed to create history directory {:?}: {}", base_dir, e);
        }

        Self {
            file: Mutex::new(None),
            base_dir,
            max_file_bytes,
        }
    }

    /// Append one record, rotating to a fresh file once the current one is full
    pub fn append(&self, record: &LogRecord) -> io::Result<()> {
        let mut guard = self.file.lock();

        if guard.is_none() {
            let reopened = match self.find_latest_log_file()? {
                Some(path) => {
                    let f = OpenOptions::new().create(true).append(true).open(&path)?;
                    (f.metadata()?.len() < self.max_file_bytes).then_some(f)
                }
                None => None,
            };
            *guard = Some(match reopened {
                Some(f) => f,
                None => self.create_new_file()?,
            });
        }

        let full = match guard.as_ref() {
            Some(f) => f.metadata()?.len() >= self.max_file_bytes,
            None => false,
        };
        if full {
            *guard = Some(self.create_new_file()?);
        }

        if let Some(file) = guard.as_mut() {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{}", json)?;
        }
        Ok(())
    }

    pub fn stats(&self) -> io::Result<HistoryStats> {
        let files = self.log_files()?;
        let mut total_bytes = 0;
        for path in &files {
            total_bytes += fs::metadata(path)?.len();
        }
        let current_file = files
            .last()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(str::to_string);

        Ok(HistoryStats {
            files: files.len(),
            total_bytes,
            current_file,
        })
    }

    fn create_new_file(&self) -> io::Result<File> {
        let now = Utc::now();
        let mut path = self
            .base_dir
            .join(format!("{}{}.jsonl", FILE_PREFIX, now.format("%Y-%m-%d-%H%M%S")));
        // Rotation can happen twice within one second
        let mut n = 1;
        while path.exists() {
            path = self.base_dir.join(format!(
                "{}{}-{}.jsonl",
                FILE_PREFIX,
                now.format("%Y-%m-%d-%H%M%S"),
                n
            ));
            n += 1;
        }
        log::debug!("Opening history file {:?}", path);
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn find_latest_log_file(&self) -> io::Result<Option<PathBuf>> {
        Ok(self.log_files()?.pop())
    }

    /// Sorted oldest first (the timestamped name orders them)
    fn log_files(&self) -> io::Result<Vec<PathBuf>> {
        list_log_files(&self.base_dir)
    }
}

fn list_log_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .filter_map(|res| res.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with(FILE_PREFIX))
        })
        .collect::<Vec<_>>();
    entries.sort_by_key(|p| file_order_key(p));
    Ok(entries)
}

/// `history-<stamp>-<n>.jsonl` sorts after `history-<stamp>.jsonl`
fn file_order_key(path: &Path) -> (String, u32) {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let body = stem.trim_start_matches(FILE_PREFIX);
    // <YYYY>-<MM>-<DD>-<HHMMSS>[-n]
    let parts: Vec<&str> = body.split('-').collect();
    if parts.len() == 5 {
        let n = parts[4].parse().unwrap_or(0);
        (parts[..4].join("-"), n)
    } else {
        (body.to_string(), 0)
    }
}

/// Read every record in order. Unparseable lines are skipped with a warning.
pub fn read_history(dir: &Path) -> io::Result<Vec<LogRecord>> {
    let mut records = Vec::new();
    for path in list_log_files(dir)? {
        let reader = BufReader::new(File::open(&path)?);
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping {:?}:{}: {}", path, i + 1, e),
            }
        }
    }
    Ok(records)
}
