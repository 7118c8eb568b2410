//! Channel monitoring engine.
//!
//! Owns the moving parts between the message source and the delivery
//! writer: per-channel state, the adaptive poll scheduler, the dedup index,
//! the bounded processing queue with its single worker, periodic health
//! checks with reconnection backoff, and the cleanup timers.

pub mod dedup;
pub mod health;
pub mod reconnect;
pub mod scheduler;
pub mod state;
mod worker;

pub use dedup::DedupIndex;
pub use health::classify;
pub use reconnect::{ReconnectController, ReconnectDirective, ReconnectState};
pub use scheduler::adaptive_interval;
pub use state::{ChannelState, ChannelStateStore};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::{ChannelSpec, ChannelStatus, MessageId};
use crate::error::Result;
use crate::history::SignalHistory;
use crate::parser::SignalParser;
use crate::port::{Event, MessageSource, NotifierRegistry};
use crate::writer::SignalWriter;

use self::health::HealthMonitor;
use self::scheduler::Scheduler;
use self::worker::Worker;

/// Tunables for the monitoring engine. The defaults match production
/// behavior; tests shrink the timers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Scheduler tick in milliseconds.
    pub tick_ms: u64,
    /// Maximum channels polled per cycle.
    pub max_batch: usize,
    /// Messages fetched per poll.
    pub poll_limit: usize,
    /// Attempts per poll before the error counts against the channel.
    pub poll_retries: u32,
    /// Bounded processing queue capacity.
    pub queue_capacity: usize,
    /// Dedup retention window in seconds.
    pub dedup_retention_secs: u64,
    /// Dedup index size bound.
    pub dedup_max_entries: usize,
    /// Health check cadence in seconds.
    pub health_interval_secs: u64,
    /// Cleanup (dedup sweep + file compaction) cadence in seconds.
    pub cleanup_interval_secs: u64,
    /// Reconnection attempts before giving up.
    pub reconnect_max_attempts: u32,
    /// How often the worker snapshots history, in seconds.
    pub history_save_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            max_batch: 10,
            poll_limit: 20,
            poll_retries: 3,
            queue_capacity: 1000,
            dedup_retention_secs: 600,
            dedup_max_entries: 100_000,
            health_interval_secs: 60,
            cleanup_interval_secs: 300,
            reconnect_max_attempts: 5,
            history_save_interval_secs: 30,
        }
    }
}

struct Running {
    shutdown: Arc<watch::Sender<bool>>,
    tasks: Vec<JoinHandle<()>>,
}

/// The monitoring engine.
///
/// `start` spawns the scheduler, the worker, the health loop and the
/// cleanup loop; `stop` halts new ticks immediately, lets the in-flight
/// cycle finish and drains the queue before returning. Start/stop may be
/// called repeatedly.
pub struct ChannelMonitor {
    source: Arc<dyn MessageSource>,
    notifier: Arc<NotifierRegistry>,
    parser: Arc<SignalParser>,
    writer: Arc<SignalWriter>,
    history: Arc<SignalHistory>,
    store: Arc<ChannelStateStore>,
    dedup: Arc<DedupIndex>,
    config: MonitorConfig,
    active: Arc<AtomicBool>,
    running: parking_lot::Mutex<Option<Running>>,
}

impl ChannelMonitor {
    /// Assemble the engine from its collaborators.
    pub fn new(
        source: Arc<dyn MessageSource>,
        notifier: Arc<NotifierRegistry>,
        parser: SignalParser,
        writer: SignalWriter,
        history: SignalHistory,
        config: MonitorConfig,
    ) -> Self {
        let dedup = DedupIndex::new(
            Duration::from_secs(config.dedup_retention_secs),
            config.dedup_max_entries,
        );
        Self {
            source,
            notifier,
            parser: Arc::new(parser),
            writer: Arc::new(writer),
            history: Arc::new(history),
            store: Arc::new(ChannelStateStore::new()),
            dedup: Arc::new(dedup),
            config,
            active: Arc::new(AtomicBool::new(false)),
            running: parking_lot::Mutex::new(None),
        }
    }

    /// Whether the engine is currently monitoring.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Snapshot of every monitored channel.
    #[must_use]
    pub fn statuses(&self) -> Vec<ChannelStatus> {
        self.store.statuses()
    }

    /// Processed-record history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<crate::domain::SignalRecord> {
        self.history.snapshot()
    }

    /// Start monitoring the given channels.
    ///
    /// Any previous run is stopped first. The output file is truncated, and
    /// each channel's cursor is seeded at its latest visible message so
    /// history from before this run is never delivered.
    ///
    /// # Errors
    ///
    /// Returns an error when the output file cannot be initialized.
    pub async fn start(&self, channels: Vec<ChannelSpec>) -> Result<()> {
        self.stop().await;

        info!(channels = channels.len(), "starting channel monitoring");
        self.writer.init().await?;

        let now = Instant::now();
        self.store.clear();
        for spec in channels {
            let cursor = match self.source.latest_message_id(&spec.handle).await {
                Ok(latest) => latest,
                Err(probe_error) => {
                    warn!(channel = %spec.name, error = %probe_error, "could not seed cursor, starting from zero");
                    MessageId::ZERO
                }
            };
            self.store
                .insert(ChannelState::seed(spec, cursor, now));
        }
        let channel_count = self.store.len();

        let (queue_tx, queue_rx) = mpsc::channel(self.config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shutdown_tx = Arc::new(shutdown_tx);

        let scheduler = Scheduler {
            source: self.source.clone(),
            store: self.store.clone(),
            dedup: self.dedup.clone(),
            queue: queue_tx,
            notifier: self.notifier.clone(),
            config: self.config.clone(),
        };
        let worker = Worker {
            parser: self.parser.clone(),
            writer: self.writer.clone(),
            history: self.history.clone(),
            notifier: self.notifier.clone(),
            history_save_interval: Duration::from_secs(self.config.history_save_interval_secs),
        };
        let health = HealthMonitor {
            source: self.source.clone(),
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
            active: self.active.clone(),
            shutdown_tx: shutdown_tx.clone(),
        };

        let tasks = vec![
            tokio::spawn(scheduler.run(shutdown_rx.clone())),
            tokio::spawn(worker.run(queue_rx, shutdown_rx.clone())),
            tokio::spawn(health.run(shutdown_rx.clone())),
            tokio::spawn(cleanup_loop(
                self.dedup.clone(),
                self.writer.clone(),
                Duration::from_secs(self.config.cleanup_interval_secs),
                shutdown_rx,
            )),
        ];

        *self.running.lock() = Some(Running {
            shutdown: shutdown_tx,
            tasks,
        });
        self.active.store(true, Ordering::SeqCst);
        self.notifier.notify_all(Event::MonitoringStatusChanged {
            active: true,
            channel_count,
            reason: "monitoring started".into(),
        });
        Ok(())
    }

    /// Stop monitoring.
    ///
    /// Idempotent. New ticks halt immediately; the in-flight cycle finishes
    /// and the queue is drained before this returns, so accepted messages
    /// are never lost.
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().take() else {
            return;
        };

        info!("stopping channel monitoring");
        let _ = running.shutdown.send(true);
        for task in running.tasks {
            if let Err(join_error) = task.await {
                error!(error = %join_error, "monitor task panicked during shutdown");
            }
        }

        self.store.clear();
        self.active.store(false, Ordering::SeqCst);
        self.notifier.notify_all(Event::MonitoringStatusChanged {
            active: false,
            channel_count: 0,
            reason: "monitoring stopped".into(),
        });
    }
}

/// Periodic dedup sweep and output-file compaction.
async fn cleanup_loop(
    dedup: Arc<DedupIndex>,
    writer: Arc<SignalWriter>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tick.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                let swept = dedup.sweep();
                if swept > 0 {
                    tracing::debug!(swept, "dedup index swept");
                }
                if let Err(cleanup_error) = writer.cleanup().await {
                    error!(error = %cleanup_error, "signal file cleanup failed");
                }
            }
        }
    }
}
