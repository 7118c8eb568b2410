//! Capped in-memory history of processed signals with JSON snapshots.
//!
//! Operators audit what the engine did through this history: every message
//! that went through the pipeline is recorded with its outcome, capped to
//! the most recent entries. Snapshots are written periodically and on stop;
//! loading a snapshot at startup is optional.

use std::path::PathBuf;

use parking_lot::Mutex;

use crate::domain::SignalRecord;
use crate::error::Result;

/// Thread-safe capped record history.
pub struct SignalHistory {
    records: Mutex<Vec<SignalRecord>>,
    path: PathBuf,
    cap: usize,
}

impl SignalHistory {
    /// Create an empty history persisted at `path`, keeping at most `cap`
    /// records.
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            path: path.into(),
            cap,
        }
    }

    /// Append a record, evicting the oldest past the cap.
    pub fn push(&self, record: SignalRecord) {
        let mut records = self.records.lock();
        records.push(record);
        if records.len() > self.cap {
            let excess = records.len() - self.cap;
            records.drain(..excess);
        }
    }

    /// Copy of the current records, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SignalRecord> {
        self.records.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop all records (the snapshot file is rewritten on the next save).
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Persist the current records as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization or the file write fails.
    pub fn save(&self) -> Result<()> {
        let records = self.snapshot();
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Load records from an existing snapshot, replacing the in-memory
    /// state. Missing files leave the history empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let json = std::fs::read_to_string(&self.path)?;
        let mut loaded: Vec<SignalRecord> = serde_json::from_str(&json)?;
        if loaded.len() > self.cap {
            let excess = loaded.len() - self.cap;
            loaded.drain(..excess);
        }
        let count = loaded.len();
        *self.records.lock() = loaded;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChannelId, MessageId, PendingMessage};
    use chrono::Utc;

    fn record(text: &str) -> SignalRecord {
        SignalRecord::begin(&PendingMessage {
            channel_id: ChannelId::new(1),
            channel_name: "test".into(),
            message_id: MessageId::new(1),
            content: text.into(),
            message_time: Utc::now(),
            received_at: Utc::now(),
        })
    }

    #[test]
    fn cap_evicts_oldest() {
        let history = SignalHistory::new("unused.json", 3);
        for i in 0..5 {
            history.push(record(&format!("message {i}")));
        }
        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].original_text, "message 2");
        assert_eq!(snapshot[2].original_text, "message 4");
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let history = SignalHistory::new(&path, 100);
        history.push(record("BUY EURUSD"));
        history.push(record("SELL GBPUSD"));
        history.save().unwrap();

        let restored = SignalHistory::new(&path, 100);
        assert_eq!(restored.load().unwrap(), 2);
        assert_eq!(restored.snapshot()[0].original_text, "BUY EURUSD");
    }

    #[test]
    fn load_missing_file_is_empty() {
        let history = SignalHistory::new("does-not-exist.json", 10);
        assert_eq!(history.load().unwrap(), 0);
        assert!(history.is_empty());
    }
}
