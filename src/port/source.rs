//! Message source port.
//!
//! This is the substitution seam for the underlying channel transport. The
//! engine only needs ordered history reads, a cursor bootstrap and a
//! liveness probe; authentication, session handling and wire protocol all
//! live behind this trait in the embedding application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ChannelHandle, MessageId};
use crate::error::SourceError;

/// One raw message as the source reports it.
#[derive(Debug, Clone)]
pub struct SourceMessage {
    pub id: MessageId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl SourceMessage {
    /// Create a message.
    pub fn new(id: impl Into<MessageId>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            timestamp,
        }
    }
}

/// Supplies ordered messages from external channels.
///
/// # Contract
///
/// - `history_since` returns messages with id strictly greater than
///   `since`, in ascending id order, at most `limit` of them.
/// - `latest_message_id` returns the highest id currently visible in the
///   channel (used to seed the cursor so old history is never replayed).
/// - `probe` is a cheap liveness check against the transport itself, not a
///   specific channel.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch messages newer than `since` for one channel, ascending by id.
    async fn history_since(
        &self,
        handle: &ChannelHandle,
        since: MessageId,
        limit: usize,
    ) -> Result<Vec<SourceMessage>, SourceError>;

    /// Highest message id currently visible in the channel.
    async fn latest_message_id(&self, handle: &ChannelHandle) -> Result<MessageId, SourceError>;

    /// Check that the transport connection is alive.
    async fn probe(&self) -> Result<(), SourceError>;
}
