//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use sigrelay::domain::{ChannelId, ChannelPriority, ChannelSpec};
use sigrelay::history::SignalHistory;
use sigrelay::monitor::{ChannelMonitor, MonitorConfig};
use sigrelay::parser::{SignalParser, SymbolMapper};
use sigrelay::port::{MessageSource, NotifierRegistry};
use sigrelay::testkit::RecordingNotifier;
use sigrelay::writer::SignalWriter;

pub struct Harness {
    pub monitor: ChannelMonitor,
    pub recorder: RecordingNotifier,
    pub output: PathBuf,
    _dir: TempDir,
}

/// Build a monitor wired to temp files, a recording notifier and a fast
/// tick. Health/cleanup/history timers are pushed out of the test window.
pub fn harness(source: Arc<dyn MessageSource>, mapper: SymbolMapper) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("signals.txt");
    let history_path = dir.path().join("history.json");

    let recorder = RecordingNotifier::new();
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(recorder.clone()));

    let config = MonitorConfig {
        tick_ms: 20,
        health_interval_secs: 3600,
        cleanup_interval_secs: 3600,
        history_save_interval_secs: 3600,
        ..MonitorConfig::default()
    };
    let writer = SignalWriter::new(
        &output,
        Duration::from_secs(5),
        Duration::from_secs(600),
        50,
    );
    let history = SignalHistory::new(&history_path, 1000);

    let monitor = ChannelMonitor::new(
        source,
        Arc::new(registry),
        SignalParser::new(mapper),
        writer,
        history,
        config,
    );

    Harness {
        monitor,
        recorder,
        output,
        _dir: dir,
    }
}

/// A high-priority channel spec (shortest idle poll interval).
pub fn channel(id: i64, name: &str, handle: &str) -> ChannelSpec {
    ChannelSpec::new(ChannelId::new(id), name, handle, ChannelPriority::High)
}

/// Data lines (non-comment, non-empty) of the output file.
pub fn data_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
