//! Append-only newline-delimited pending-queue file (§4.7).
//!
//! Writers acquire an exclusive advisory lock with a timeout; readers
//! atomically read the whole file, rewrite the remaining lines to a temp
//! file, and rename — mirroring the classification-queue design this is
//! adapted from. Malformed lines are preserved (quarantined) rather than
//! dropped, so a poison record never silently loses data.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use memento_domain::entities::{Collection, TrustBand};
use memento_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One queued storage request: a payload plus enough context to retry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedRecord {
    pub record_id: String,
    pub collection: Collection,
    pub trust_band: TrustBand,
    /// JSON-encoded `MemoryItem`, kept opaque here to avoid a dependency cycle.
    pub payload: serde_json::Value,
    #[serde(default)]
    pub retry_count: u32,
    pub last_error: Option<String>,
}

/// Handle to one queue file.
pub struct PendingQueue {
    path: PathBuf,
    lock_timeout: Duration,
}

impl PendingQueue {
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>, lock_timeout: Duration) -> Self {
        Self {
            path: state_dir.as_ref().join("pending_queue.jsonl"),
            lock_timeout,
        }
    }

    /// Append one record to the queue.
    pub fn enqueue(&self, record: &QueuedRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io_with_source("failed to create queue directory", e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io_with_source("failed to open pending queue file", e))?;

        self.acquire_lock(&file)?;
        let line = serde_json::to_string(record)? + "\n";
        let result = file
            .write_all(line.as_bytes())
            .map_err(|e| Error::io_with_source("failed to append to pending queue", e));
        let _ = file.unlock();
        result
    }

    /// Drain up to `batch_size` records FIFO, removing them from the file.
    /// Lines that fail to parse are preserved verbatim for later inspection.
    pub fn dequeue_batch(&self, batch_size: usize) -> Result<Vec<QueuedRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(|e| Error::io_with_source("failed to open pending queue file", e))?;

        self.acquire_lock(&file)?;

        let mut contents = String::new();
        let read_result = file
            .read_to_string(&mut contents)
            .map_err(|e| Error::io_with_source("failed to read pending queue", e));

        if let Err(e) = read_result {
            let _ = file.unlock();
            return Err(e);
        }

        let mut records = Vec::new();
        let mut remaining_lines = Vec::new();

        for line in BufReader::new(contents.as_bytes()).lines().map_while(|l| l.ok()) {
            if line.trim().is_empty() {
                continue;
            }
            if records.len() < batch_size {
                match serde_json::from_str::<QueuedRecord>(&line) {
                    Ok(record) => records.push(record),
                    Err(_) => remaining_lines.push(line),
                }
            } else {
                remaining_lines.push(line);
            }
        }

        if !records.is_empty() {
            self.rewrite_atomically(&remaining_lines)?;
        }

        let _ = file.unlock();
        Ok(records)
    }

    /// Re-enqueue a record after a failed attempt, bumping its retry count.
    pub fn requeue(&self, mut record: QueuedRecord, error: impl Into<String>) -> Result<()> {
        record.retry_count += 1;
        record.last_error = Some(error.into());
        self.enqueue(&record)
    }

    /// Move an exhausted record into the dead-letter file.
    pub fn dead_letter(&self, record: &QueuedRecord) -> Result<()> {
        let dead_letter_path = self.path.with_file_name("dead_letter.jsonl");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&dead_letter_path)
            .map_err(|e| Error::io_with_source("failed to open dead-letter file", e))?;
        let line = serde_json::to_string(record)? + "\n";
        file.write_all(line.as_bytes())
            .map_err(|e| Error::io_with_source("failed to append to dead-letter file", e))
    }

    fn acquire_lock(&self, file: &File) -> Result<()> {
        let start = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(()),
                Err(_) if start.elapsed() < self.lock_timeout => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(_) => {
                    return Err(Error::queue(format!(
                        "timed out acquiring pending-queue lock after {:?}",
                        self.lock_timeout
                    )))
                }
            }
        }
    }

    fn rewrite_atomically(&self, remaining_lines: &[String]) -> Result<()> {
        let temp_path = self.path.with_extension("tmp");
        let mut content = remaining_lines.join("\n");
        if !remaining_lines.is_empty() {
            content.push('\n');
        }
        std::fs::write(&temp_path, content)
            .map_err(|e| Error::io_with_source("failed to write temp queue file", e))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| Error::io_with_source("failed to rename temp queue file", e))
    }

    /// Current queue size, for metrics.
    #[must_use]
    pub fn size(&self) -> usize {
        let Ok(file) = File::open(&self.path) else {
            return 0;
        };
        BufReader::new(file)
            .lines()
            .map_while(|l| l.ok())
            .filter(|l| !l.trim().is_empty())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memento_domain::entities::{Collection, TrustBand};
    use tempfile::tempdir;

    fn sample_record(id: &str) -> QueuedRecord {
        QueuedRecord {
            record_id: id.to_owned(),
            collection: Collection::Discussions,
            trust_band: TrustBand::Medium,
            payload: serde_json::json!({"content": "hello"}),
            retry_count: 0,
            last_error: None,
        }
    }

    #[test]
    fn enqueue_then_dequeue_round_trips() {
        let dir = tempdir().unwrap();
        let queue = PendingQueue::new(dir.path(), Duration::from_secs(1));
        queue.enqueue(&sample_record("a")).unwrap();
        queue.enqueue(&sample_record("b")).unwrap();

        let batch = queue.dequeue_batch(10).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.size(), 0);
    }

    #[test]
    fn dequeue_respects_batch_size_and_preserves_remainder() {
        let dir = tempdir().unwrap();
        let queue = PendingQueue::new(dir.path(), Duration::from_secs(1));
        for i in 0..5 {
            queue.enqueue(&sample_record(&format!("r{i}"))).unwrap();
        }

        let batch = queue.dequeue_batch(2).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.size(), 3);
    }

    #[test]
    fn malformed_line_is_preserved_not_dropped() {
        let dir = tempdir().unwrap();
        let queue = PendingQueue::new(dir.path(), Duration::from_secs(1));
        queue.enqueue(&sample_record("good")).unwrap();
        std::fs::write(
            dir.path().join("pending_queue.jsonl"),
            format!(
                "{}\nnot valid json\n",
                std::fs::read_to_string(dir.path().join("pending_queue.jsonl"))
                    .unwrap()
                    .trim_end()
            ),
        )
        .unwrap();

        let batch = queue.dequeue_batch(10).unwrap();
        assert_eq!(batch.len(), 1);
        // the poison line survives in the file for manual inspection
        assert_eq!(queue.size(), 1);
    }
}
