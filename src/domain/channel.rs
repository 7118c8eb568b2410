//! Channel identity, priority and health types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::{ChannelHandle, ChannelId};

/// Polling priority for a monitored channel.
///
/// Priority determines the base polling interval: High channels are polled
/// every second, Medium every two, Low every five. The adaptive scheduler
/// tightens or relaxes these baselines from observed activity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ChannelPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for ChannelPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

/// Health classification of a monitored channel.
///
/// Health only moves after threshold breaches, never from a single bad
/// sample; see the classifier in the monitor module for the exact rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelHealth {
    #[default]
    Unknown,
    Healthy,
    Warning,
    Inactive,
    Critical,
}

impl fmt::Display for ChannelHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Inactive => "inactive",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Static identity of a channel to monitor, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Unique channel identifier.
    pub id: ChannelId,
    /// Human-readable channel name, used in output lines and events.
    pub name: String,
    /// Opaque adapter handle for this channel.
    pub handle: ChannelHandle,
    /// Polling priority.
    pub priority: ChannelPriority,
}

impl ChannelSpec {
    /// Create a new channel spec.
    pub fn new(
        id: ChannelId,
        name: impl Into<String>,
        handle: impl Into<ChannelHandle>,
        priority: ChannelPriority,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            handle: handle.into(),
            priority,
        }
    }
}

/// Point-in-time observability snapshot of a monitored channel.
#[derive(Debug, Clone)]
pub struct ChannelStatus {
    pub id: ChannelId,
    pub name: String,
    pub priority: ChannelPriority,
    pub health: ChannelHealth,
    /// Total messages accepted from this channel since monitoring started.
    pub message_count: u64,
    /// Messages per minute over the trailing five-minute window.
    pub message_rate: f64,
    pub consecutive_errors: u32,
}
