//! The single processing worker.
//!
//! One background task drains the bounded queue and runs each message
//! through parse → record → write, one at a time. Emission order therefore
//! equals queue order. On shutdown the worker drains whatever was already
//! accepted so messages are never silently lost.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

use crate::domain::{PendingMessage, SignalRecord, SignalStatus};
use crate::history::SignalHistory;
use crate::parser::{ParseOutcome, SignalParser};
use crate::port::{Event, NotifierRegistry};
use crate::writer::{SignalWriter, WriteOutcome};

pub(crate) struct Worker {
    pub parser: Arc<SignalParser>,
    pub writer: Arc<SignalWriter>,
    pub history: Arc<SignalHistory>,
    pub notifier: Arc<NotifierRegistry>,
    pub history_save_interval: Duration,
}

impl Worker {
    pub async fn run(
        self,
        mut queue: mpsc::Receiver<PendingMessage>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut save_tick = tokio::time::interval(self.history_save_interval);
        save_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        save_tick.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = save_tick.tick() => self.save_history(),
                message = queue.recv() => match message {
                    Some(message) => self.process(message).await,
                    None => break,
                },
            }
        }

        // Drain synchronously: the scheduler drops its sender on shutdown,
        // so recv() returns None only once everything accepted into the
        // queue has been processed.
        let mut drained = 0usize;
        while let Some(message) = queue.recv().await {
            self.process(message).await;
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "processed queued messages during shutdown");
        }
        self.save_history();
        debug!("worker stopped");
    }

    /// Run one message through the pipeline and record the outcome.
    async fn process(&self, message: PendingMessage) {
        let started = Instant::now();
        let waited = message
            .waited(Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);

        let mut record = SignalRecord::begin(&message);

        match self.parser.parse(&message.content) {
            Ok(ParseOutcome::Signal(signal)) => {
                record.signal = Some(signal.clone());
                match self
                    .writer
                    .write(record.channel_id, &record.channel_name, &signal)
                    .await
                {
                    Ok(WriteOutcome::Written) => {
                        record.status = SignalStatus::Delivered;
                    }
                    Ok(WriteOutcome::Duplicate) => {
                        record.status = SignalStatus::Duplicate;
                    }
                    Err(write_error) => {
                        record.status = SignalStatus::WriteFailed;
                        record.error = Some(write_error.to_string());
                        self.notifier.notify_all(Event::Error(format!(
                            "delivery failed for {}: {write_error}",
                            signal.describe()
                        )));
                    }
                }
            }
            Ok(ParseOutcome::NoSignal) => {
                record.status = SignalStatus::NoSignal;
            }
            Ok(ParseOutcome::Invalid(reason)) => {
                record.status = SignalStatus::Invalid;
                record.error = Some(reason.to_string());
            }
            Err(mapping_error) => {
                record.status = SignalStatus::Rejected;
                record.error = Some(mapping_error.to_string());
                self.notifier
                    .notify_all(Event::Error(mapping_error.to_string()));
            }
        }

        self.history.push(record.clone());
        self.notifier.notify_all(Event::NewSignal {
            record,
            waited,
            elapsed: started.elapsed(),
        });
    }

    fn save_history(&self) {
        if let Err(save_error) = self.history.save() {
            error!(error = %save_error, "failed to persist signal history");
        }
    }
}
