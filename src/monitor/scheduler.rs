//! Adaptive poll scheduling.
//!
//! A fixed 500 ms tick selects which channels are due, bounded to ten per
//! cycle, and polls the batch concurrently. Cycles never overlap: the loop
//! awaits the batch inline and skips (never queues) ticks that elapse while
//! a cycle is still in flight. Per-channel cadence adapts to priority,
//! observed message rate and consecutive empty polls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::domain::{ChannelPriority, PendingMessage};
use crate::error::SourceError;
use crate::port::{Event, MessageSource, NotifierRegistry};

use super::dedup::DedupIndex;
use super::state::{ChannelState, ChannelStateStore};
use super::MonitorConfig;

/// Compute how long a channel may rest between polls.
///
/// Very active channels poll at the 500 ms floor regardless of priority;
/// quiet channels back off toward 30 s.
#[must_use]
pub fn adaptive_interval(state: &ChannelState) -> Duration {
    let base = match state.priority {
        ChannelPriority::High => Duration::from_secs(1),
        ChannelPriority::Medium => Duration::from_secs(2),
        ChannelPriority::Low => Duration::from_secs(5),
    };

    if state.recent_message_rate > 10.0 {
        return Duration::from_millis(500);
    }
    if state.recent_message_rate > 5.0 {
        return base;
    }
    if state.recent_message_rate > 1.0 {
        return base * 2;
    }

    if state.consecutive_empty_polls > 10 {
        return Duration::from_secs(30);
    }
    if state.consecutive_empty_polls > 5 {
        return Duration::from_secs(10);
    }
    base * 3
}

/// The scheduler loop and its collaborators.
pub(crate) struct Scheduler {
    pub source: Arc<dyn MessageSource>,
    pub store: Arc<ChannelStateStore>,
    pub dedup: Arc<DedupIndex>,
    pub queue: mpsc::Sender<PendingMessage>,
    pub notifier: Arc<NotifierRegistry>,
    pub config: MonitorConfig,
}

impl Scheduler {
    /// Run until shutdown is signalled. Consumes the queue sender, so the
    /// worker sees end-of-stream once the scheduler exits.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(Duration::from_millis(self.config.tick_ms));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tick.tick() => self.cycle().await,
            }
        }
        debug!("scheduler stopped");
    }

    /// One polling cycle: select due channels and poll them concurrently.
    async fn cycle(&self) {
        let due = self
            .store
            .take_due(Instant::now(), self.config.max_batch, adaptive_interval);
        if due.is_empty() {
            return;
        }

        let started = Instant::now();
        let count = due.len();
        let polls = due.into_iter().map(|mut state| async move {
            poll_with_retry(
                self.source.as_ref(),
                &mut state,
                &self.dedup,
                &self.queue,
                &self.notifier,
                &self.config,
            )
            .await;
            state
        });

        for state in join_all(polls).await {
            self.store.restore(state);
        }

        debug!(
            channels = count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "polling cycle finished"
        );
    }
}

/// Poll one channel, retrying transient failures with a linear backoff.
/// Exhausting the retries marks the error on the channel but never affects
/// the rest of the batch.
pub(crate) async fn poll_with_retry(
    source: &dyn MessageSource,
    state: &mut ChannelState,
    dedup: &DedupIndex,
    queue: &mpsc::Sender<PendingMessage>,
    notifier: &NotifierRegistry,
    config: &MonitorConfig,
) {
    let mut last_error: Option<SourceError> = None;
    for attempt in 1..=config.poll_retries {
        match poll_channel(source, state, dedup, queue, config).await {
            Ok(fresh) => {
                state.consecutive_errors = 0;
                if fresh > 0 {
                    debug!(channel = %state.name, fresh, "accepted new messages");
                }
                state.last_poll = Instant::now();
                return;
            }
            Err(error) => {
                warn!(channel = %state.name, attempt, error = %error, "poll attempt failed");
                last_error = Some(error);
                if attempt < config.poll_retries {
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
            }
        }
    }

    state.consecutive_errors += 1;
    state.last_poll = Instant::now();
    if let Some(error) = last_error {
        notifier.notify_all(Event::Error(format!(
            "polling {} failed after {} attempts: {error}",
            state.name, config.poll_retries
        )));
    }
}

/// Single poll attempt: fetch messages past the cursor, drop empty text,
/// dedup, enqueue, advance the cursor and refresh the rate estimate.
async fn poll_channel(
    source: &dyn MessageSource,
    state: &mut ChannelState,
    dedup: &DedupIndex,
    queue: &mpsc::Sender<PendingMessage>,
    config: &MonitorConfig,
) -> Result<usize, SourceError> {
    let messages = source
        .history_since(&state.handle, state.cursor, config.poll_limit)
        .await?;

    let now = Utc::now();
    let mut fresh = 0usize;
    let mut seen_any = false;
    let mut recent = 0usize;

    for message in &messages {
        state.advance_cursor(message.id);
        if message.text.trim().is_empty() {
            continue;
        }
        seen_any = true;
        if now.signed_duration_since(message.timestamp) <= chrono::Duration::minutes(5) {
            recent += 1;
        }
        if !dedup.insert_if_fresh(state.id, message.id, &message.text) {
            continue;
        }

        let pending = PendingMessage {
            channel_id: state.id,
            channel_name: state.name.clone(),
            message_id: message.id,
            content: message.text.clone(),
            message_time: message.timestamp,
            received_at: now,
        };
        // A closed queue means shutdown is in progress; stop accepting.
        if queue.send(pending).await.is_err() {
            break;
        }
        fresh += 1;
        state.message_count += 1;
        state.last_message = Instant::now();
    }

    if seen_any {
        state.consecutive_empty_polls = 0;
        state.recent_message_rate = recent as f64 / 5.0;
    } else {
        state.consecutive_empty_polls += 1;
    }

    Ok(fresh)
}
