//! Messages in flight between discovery and processing.

use chrono::{DateTime, Utc};

use super::id::{ChannelId, MessageId};

/// A message accepted by a poll and queued for parsing.
///
/// Produced exactly once per (channel, message id, content) within the dedup
/// window, consumed exactly once by the processing worker, then discarded.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub message_id: MessageId,
    /// Raw message text as received from the source.
    pub content: String,
    /// When the source says the message was posted.
    pub message_time: DateTime<Utc>,
    /// When the poll picked it up.
    pub received_at: DateTime<Utc>,
}

impl PendingMessage {
    /// Queue latency so far: time between receipt and `now`.
    #[must_use]
    pub fn waited(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.received_at)
    }
}
