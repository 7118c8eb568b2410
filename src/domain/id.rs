//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Channel identifier - newtype for type safety.
///
/// The inner i64 is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(i64);

impl ChannelId {
    /// Create a new `ChannelId` from an i64 value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChannelId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Message identifier within a channel.
///
/// Message ids are assigned by the source and increase monotonically within
/// a channel, which makes them usable as a polling cursor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct MessageId(i64);

impl MessageId {
    /// Cursor value before any message has been processed.
    pub const ZERO: Self = Self(0);

    /// Create a new `MessageId` from an i64 value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

/// Opaque handle the source adapter uses to address a channel.
///
/// The engine never interprets the contents; it is carried verbatim from
/// configuration to the adapter (e.g. an access-hash-qualified peer ref).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelHandle(String);

impl ChannelHandle {
    /// Create a new `ChannelHandle` from a string.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Get the handle as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ChannelHandle {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ChannelHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_id_new_and_value() {
        let id = ChannelId::new(42);
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn channel_id_display() {
        let id = ChannelId::new(1001);
        assert_eq!(format!("{}", id), "1001");
    }

    #[test]
    fn message_id_ordering() {
        assert!(MessageId::new(2) > MessageId::new(1));
        assert!(MessageId::ZERO < MessageId::new(1));
    }

    #[test]
    fn message_id_default_is_zero() {
        assert_eq!(MessageId::default(), MessageId::ZERO);
    }

    #[test]
    fn channel_handle_as_str() {
        let handle = ChannelHandle::from("peer:123:abc");
        assert_eq!(handle.as_str(), "peer:123:abc");
    }
}
