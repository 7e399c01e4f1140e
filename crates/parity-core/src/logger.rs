//! Round Logger
//!
//! Append-only JSONL logging of round records, plus snapshot output.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use parity_events::{PopulationSnapshot, RoundRecord};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes one [`RoundRecord`] per line
pub struct RoundLogger {
    writer: Option<BufWriter<File>>,
    record_count: u64,
}

impl RoundLogger {
    /// Create a new logger writing to the specified path, truncating it
    pub fn new(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            record_count: 0,
        })
    }

    /// Create a logger that discards records
    pub fn null() -> Self {
        Self {
            writer: None,
            record_count: 0,
        }
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn log(&mut self, record: &RoundRecord) -> Result<(), LogError> {
        self.record_count += 1;
        if let Some(ref mut writer) = self.writer {
            let line = record.to_jsonl()?;
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), LogError> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for RoundLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to flush round logger: {}", e);
        }
    }
}

/// Writes a snapshot as pretty JSON, replacing any existing file.
pub fn write_snapshot(
    path: impl AsRef<Path>,
    snapshot: &PopulationSnapshot,
) -> Result<(), LogError> {
    let json = snapshot.to_json_pretty()?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_events::fixtures;
    use std::io::BufRead;

    #[test]
    fn test_round_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rounds.jsonl");

        let rounds = fixtures::sample_rounds();
        {
            let mut logger = RoundLogger::new(&path).unwrap();
            for record in &rounds {
                logger.log(record).unwrap();
            }
            assert_eq!(logger.record_count(), 3);
        }

        let file = File::open(&path).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 3);

        let parsed = RoundRecord::from_jsonl(&lines[2]).unwrap();
        assert_eq!(parsed, rounds[2]);
    }

    #[test]
    fn test_null_logger() {
        let mut logger = RoundLogger::null();
        logger.log(&RoundRecord::new(1)).unwrap();
        logger.flush().unwrap();
        assert_eq!(logger.record_count(), 1);
    }

    #[test]
    fn test_write_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let snapshot = fixtures::sample_snapshot();

        write_snapshot(&path, &snapshot).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(PopulationSnapshot::from_json(&content).unwrap(), snapshot);
    }
}
