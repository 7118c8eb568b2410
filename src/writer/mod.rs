//! Durable delivery writer.
//!
//! Serializes validated signals into the shared append-only file the
//! external trading robot tails. Everything that touches the file — the
//! startup truncation, the pre-append duplicate scan, the append itself and
//! the periodic compaction — runs under one writer lock owned by this
//! struct, so the scan-then-append sequence is race-free within the
//! process. External readers need no coordination: the file is line
//! oriented and append-only between compactions.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{ChannelId, ParsedSignal};
use crate::error::WriteError;

/// Timestamp layout used in output lines, local time.
const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// How a write call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The line was appended and flushed.
    Written,
    /// An equivalent signal was already written inside the duplicate
    /// window; nothing was appended.
    Duplicate,
}

/// Duplicate-suppressing writer for the robot signal file.
pub struct SignalWriter {
    path: PathBuf,
    lock: Mutex<()>,
    lock_timeout: Duration,
    duplicate_window: Duration,
    scan_depth: usize,
}

impl SignalWriter {
    /// Create a writer for `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        lock_timeout: Duration,
        duplicate_window: Duration,
        scan_depth: usize,
    ) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            lock_timeout,
            duplicate_window,
            scan_depth,
        }
    }

    /// Destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate the destination and write a fresh comment header.
    ///
    /// Runs at monitoring start so signals from a previous run are never
    /// replayed by the robot.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Io`] when the file or its directory cannot be
    /// created.
    pub async fn init(&self) -> Result<(), WriteError> {
        let _guard = self.lock.lock().await;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let header = format!(
            "# signal delivery file - cleared on startup\n\
             # started: {}\n\
             # format: TIMESTAMP|CHANNEL_ID|CHANNEL_NAME|DIRECTION|SYMBOL|ENTRY|SL|TP1|TP2|TP3|STATUS|ORDER_TYPE\n\n",
            Local::now().format(TIMESTAMP_FORMAT)
        );
        fs::write(&self.path, header)?;
        info!(path = %self.path.display(), "signal file cleared");
        Ok(())
    }

    /// Append one signal line unless an equivalent one was written within
    /// the duplicate window.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::LockTimeout`] when the writer lock cannot be
    /// acquired in time (the write is abandoned) and [`WriteError::Io`] on
    /// file errors.
    pub async fn write(
        &self,
        channel_id: ChannelId,
        channel_name: &str,
        signal: &ParsedSignal,
    ) -> Result<WriteOutcome, WriteError> {
        let guard = tokio::time::timeout(self.lock_timeout, self.lock.lock())
            .await
            .map_err(|_| WriteError::LockTimeout {
                timeout_secs: self.lock_timeout.as_secs(),
            })?;

        if self.recent_duplicate(channel_id, channel_name, signal)? {
            debug!(signal = %signal.describe(), "suppressed duplicate signal line");
            return Ok(WriteOutcome::Duplicate);
        }

        let line = format_line(channel_id, channel_name, signal);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        file.flush()?;
        drop(guard);

        info!(signal = %signal.describe(), "signal written");
        Ok(WriteOutcome::Written)
    }

    /// Scan the tail of the file for a line with the same
    /// (channel, direction, symbol) signature younger than the window.
    fn recent_duplicate(
        &self,
        channel_id: ChannelId,
        channel_name: &str,
        signal: &ParsedSignal,
    ) -> Result<bool, WriteError> {
        if !self.path.exists() {
            return Ok(false);
        }
        let signature = format!(
            "|{}|{}|{}|{}|",
            channel_id, channel_name, signal.direction, signal.final_symbol
        );
        let cutoff = Local::now().naive_local()
            - chrono::Duration::from_std(self.duplicate_window).unwrap_or_default();

        let content = fs::read_to_string(&self.path)?;
        let recent: Vec<&str> = content
            .lines()
            .rev()
            .take(self.scan_depth)
            .collect();

        for line in recent {
            if line.starts_with('#') || !line.contains(&signature) {
                continue;
            }
            if let Some(stamp) = parse_line_timestamp(line) {
                if stamp > cutoff {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Rewrite the file keeping comments and lines younger than the
    /// duplicate window, bounding growth between runs.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Io`] on file errors.
    pub async fn cleanup(&self) -> Result<usize, WriteError> {
        let _guard = self.lock.lock().await;
        if !self.path.exists() {
            return Ok(0);
        }
        let cutoff = Local::now().naive_local()
            - chrono::Duration::from_std(self.duplicate_window).unwrap_or_default();

        let content = fs::read_to_string(&self.path)?;
        let mut kept = Vec::new();
        let mut dropped = 0usize;
        for line in content.lines() {
            if line.starts_with('#') || line.trim().is_empty() {
                kept.push(line);
                continue;
            }
            match parse_line_timestamp(line) {
                Some(stamp) if stamp > cutoff => kept.push(line),
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            let mut rewritten = kept.join("\n");
            rewritten.push('\n');
            fs::write(&self.path, rewritten)?;
            debug!(dropped, "compacted signal file");
        }
        Ok(dropped)
    }
}

/// Render one output line. Absent prices serialize as zero; all numeric
/// fields carry exactly five decimals; status is always literal NEW.
fn format_line(channel_id: ChannelId, channel_name: &str, signal: &ParsedSignal) -> String {
    let price = |value: Option<Decimal>| format!("{:.5}", value.unwrap_or_default());
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|NEW|{}",
        Local::now().format(TIMESTAMP_FORMAT),
        channel_id,
        channel_name,
        signal.direction,
        signal.final_symbol,
        price(signal.entry),
        price(signal.stop_loss),
        price(signal.take_profit_1),
        price(signal.take_profit_2),
        price(signal.take_profit_3),
        signal.order_type,
    )
}

/// Timestamp of a data line, if its first field parses.
fn parse_line_timestamp(line: &str) -> Option<NaiveDateTime> {
    let first = line.split('|').next()?;
    NaiveDateTime::parse_from_str(first, TIMESTAMP_FORMAT).ok()
}
