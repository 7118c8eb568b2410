//! Notifier port for engine events.
//!
//! The engine reports everything user-visible through an injected sink
//! rather than ambient global state: the embedding application registers
//! whatever notifiers it wants (UI bridge, log, test recorder) and the core
//! broadcasts to all of them.

use std::time::Duration;

use crate::domain::{ChannelHealth, ChannelId, SignalRecord};

/// Events emitted by the monitoring engine.
#[derive(Debug, Clone)]
pub enum Event {
    /// A message finished the parse/write pipeline. Emitted for every
    /// outcome; inspect `record.status` for the disposition.
    NewSignal {
        record: SignalRecord,
        /// Time the message spent queued before the worker picked it up.
        waited: Duration,
        /// Time the worker spent parsing and writing.
        elapsed: Duration,
    },
    /// A recoverable error was observed and handled.
    Error(String),
    /// Diagnostic detail, useful when tracing a misbehaving channel.
    Debug(String),
    /// Monitoring started, stopped, or changed shape.
    MonitoringStatusChanged {
        active: bool,
        channel_count: usize,
        reason: String,
    },
    /// A channel's computed health differs from its previous value.
    ChannelHealthChanged {
        channel_id: ChannelId,
        channel_name: String,
        health: ChannelHealth,
    },
}

/// Trait for event sinks.
///
/// Implementations must be thread-safe and must not block: `notify` is
/// called from hot paths (the poll cycle and the worker loop). Spawn a task
/// for anything slow.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
#[derive(Default)]
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

/// A no-op notifier for tests or headless runs.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A notifier that forwards events to tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{debug, error, info, warn};
        match event {
            Event::NewSignal {
                record,
                waited,
                elapsed,
            } => {
                info!(
                    channel = %record.channel_name,
                    status = %record.status,
                    waited_ms = waited.as_millis() as u64,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Signal processed"
                );
            }
            Event::Error(message) => {
                error!(message = %message, "Engine error");
            }
            Event::Debug(message) => {
                debug!(message = %message, "Engine debug");
            }
            Event::MonitoringStatusChanged {
                active,
                channel_count,
                reason,
            } => {
                info!(active, channels = channel_count, reason = %reason, "Monitoring status changed");
            }
            Event::ChannelHealthChanged {
                channel_id,
                channel_name,
                health,
            } => {
                warn!(
                    channel_id = %channel_id,
                    channel = %channel_name,
                    health = %health,
                    "Channel health changed"
                );
            }
        }
    }
}
