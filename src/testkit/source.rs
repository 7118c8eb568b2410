//! Mock [`MessageSource`] implementations for testing.
//!
//! - [`ScriptedSource`] — pre-loaded per-call results. Best for retry,
//!   error-isolation and reconnection tests.
//! - [`ChannelFeedSource`] — per-channel message feeds pushed at runtime
//!   through a handle. Best for end-to-end monitor tests needing precise,
//!   on-demand message delivery.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domain::{ChannelHandle, MessageId};
use crate::error::SourceError;
use crate::port::{MessageSource, SourceMessage};

/// A mock source with scripted results.
///
/// Each `history_since` / `latest_message_id` / `probe` call pops the next
/// scripted result from its queue; exhausted queues fall back to empty
/// history, id zero and a healthy probe.
pub struct ScriptedSource {
    history: Mutex<VecDeque<Result<Vec<SourceMessage>, SourceError>>>,
    latest: Mutex<VecDeque<Result<MessageId, SourceError>>>,
    probes: Mutex<VecDeque<Result<(), SourceError>>>,
    history_calls: Arc<AtomicU32>,
    probe_calls: Arc<AtomicU32>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            history: Mutex::new(VecDeque::new()),
            latest: Mutex::new(VecDeque::new()),
            probes: Mutex::new(VecDeque::new()),
            history_calls: Arc::new(AtomicU32::new(0)),
            probe_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_history(self, results: Vec<Result<Vec<SourceMessage>, SourceError>>) -> Self {
        *self.history.lock() = results.into();
        self
    }

    pub fn with_latest(self, results: Vec<Result<MessageId, SourceError>>) -> Self {
        *self.latest.lock() = results.into();
        self
    }

    pub fn with_probes(self, results: Vec<Result<(), SourceError>>) -> Self {
        *self.probes.lock() = results.into();
        self
    }

    /// Shared counters for asserting call counts.
    pub fn counts(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (self.history_calls.clone(), self.probe_calls.clone())
    }

    pub fn history_calls(&self) -> u32 {
        self.history_calls.load(Ordering::SeqCst)
    }

    pub fn probe_calls(&self) -> u32 {
        self.probe_calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSource for ScriptedSource {
    async fn history_since(
        &self,
        _handle: &ChannelHandle,
        since: MessageId,
        _limit: usize,
    ) -> Result<Vec<SourceMessage>, SourceError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.history.lock().pop_front();
        match next {
            Some(Ok(messages)) => Ok(messages
                .into_iter()
                .filter(|message| message.id > since)
                .collect()),
            Some(Err(error)) => Err(error),
            None => Ok(Vec::new()),
        }
    }

    async fn latest_message_id(&self, _handle: &ChannelHandle) -> Result<MessageId, SourceError> {
        let next = self.latest.lock().pop_front();
        match next {
            Some(result) => result,
            None => Ok(MessageId::ZERO),
        }
    }

    async fn probe(&self) -> Result<(), SourceError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probes.lock().pop_front().unwrap_or(Ok(()))
    }
}

/// Per-channel feed state.
#[derive(Default)]
struct Feed {
    messages: Vec<SourceMessage>,
}

/// A mock source whose channels are fed externally via
/// [`ChannelFeedHandle`]. `history_since` serves whatever has been pushed
/// past the cursor, in ascending id order.
pub struct ChannelFeedSource {
    feeds: Arc<Mutex<std::collections::HashMap<String, Feed>>>,
    probe_ok: Arc<Mutex<bool>>,
}

/// Control handle for a [`ChannelFeedSource`].
#[derive(Clone)]
pub struct ChannelFeedHandle {
    feeds: Arc<Mutex<std::collections::HashMap<String, Feed>>>,
    probe_ok: Arc<Mutex<bool>>,
}

impl ChannelFeedHandle {
    /// Append a message to a channel's feed.
    pub fn push(&self, handle: &str, id: i64, text: &str) {
        let mut feeds = self.feeds.lock();
        let feed = feeds.entry(handle.to_string()).or_default();
        feed.messages
            .push(SourceMessage::new(id, text, Utc::now()));
    }

    /// Make subsequent probes fail or succeed.
    pub fn set_probe_ok(&self, ok: bool) {
        *self.probe_ok.lock() = ok;
    }
}

/// Create a [`ChannelFeedSource`] and its control handle.
pub fn channel_feed() -> (ChannelFeedSource, ChannelFeedHandle) {
    let feeds = Arc::new(Mutex::new(std::collections::HashMap::new()));
    let probe_ok = Arc::new(Mutex::new(true));
    (
        ChannelFeedSource {
            feeds: feeds.clone(),
            probe_ok: probe_ok.clone(),
        },
        ChannelFeedHandle { feeds, probe_ok },
    )
}

#[async_trait]
impl MessageSource for ChannelFeedSource {
    async fn history_since(
        &self,
        handle: &ChannelHandle,
        since: MessageId,
        limit: usize,
    ) -> Result<Vec<SourceMessage>, SourceError> {
        let feeds = self.feeds.lock();
        let Some(feed) = feeds.get(handle.as_str()) else {
            return Ok(Vec::new());
        };
        let mut newer: Vec<SourceMessage> = feed
            .messages
            .iter()
            .filter(|message| message.id > since)
            .cloned()
            .collect();
        newer.sort_by_key(|message| message.id);
        newer.truncate(limit);
        Ok(newer)
    }

    async fn latest_message_id(&self, handle: &ChannelHandle) -> Result<MessageId, SourceError> {
        let feeds = self.feeds.lock();
        Ok(feeds
            .get(handle.as_str())
            .and_then(|feed| feed.messages.iter().map(|m| m.id).max())
            .unwrap_or(MessageId::ZERO))
    }

    async fn probe(&self) -> Result<(), SourceError> {
        if *self.probe_ok.lock() {
            Ok(())
        } else {
            Err(SourceError::Connection("probe scripted to fail".into()))
        }
    }
}
