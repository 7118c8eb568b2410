//! Processing outcome records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ChannelId, MessageId};
use super::message::PendingMessage;
use super::signal::ParsedSignal;

/// Final disposition of one processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    /// No recognizable trading-signal pattern in the text.
    NoSignal,
    /// Parsed, but failed the validation gate (missing or economically
    /// inconsistent fields).
    Invalid,
    /// Symbol was blocked by the configured exclusion or allow-list.
    Rejected,
    /// Written to the output file.
    Delivered,
    /// Suppressed because an equivalent line was written recently.
    Duplicate,
    /// The writer failed (lock timeout or I/O error).
    WriteFailed,
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoSignal => "no signal detected",
            Self::Invalid => "invalid signal",
            Self::Rejected => "symbol rejected",
            Self::Delivered => "delivered",
            Self::Duplicate => "duplicate suppressed",
            Self::WriteFailed => "write failed",
        };
        write!(f, "{s}")
    }
}

/// Record of one message that went through the processing pipeline.
///
/// Kept in a capped in-memory history (last 1000) regardless of outcome, so
/// operators can see what was parsed, what was skipped and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub channel_id: ChannelId,
    pub channel_name: String,
    pub message_id: MessageId,
    pub original_text: String,
    pub signal: Option<ParsedSignal>,
    pub status: SignalStatus,
    /// Detail for Rejected / WriteFailed outcomes.
    pub error: Option<String>,
}

impl SignalRecord {
    /// Start a record for a dequeued message. Status is provisional until
    /// the pipeline finishes.
    #[must_use]
    pub fn begin(message: &PendingMessage) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            channel_id: message.channel_id,
            channel_name: message.channel_name.clone(),
            message_id: message.message_id,
            original_text: message.content.clone(),
            signal: None,
            status: SignalStatus::NoSignal,
            error: None,
        }
    }
}
