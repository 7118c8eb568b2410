//! Time-windowed content deduplication.

use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::{ChannelId, MessageId};

/// Content-hash index preventing the same message from being enqueued twice
/// within the retention window.
///
/// The key hashes (channel, message id, content) together: edits that keep
/// the id but change the text re-enter the pipeline, and identical text
/// reposted in another channel is still delivered there.
pub struct DedupIndex {
    entries: DashMap<u64, Instant>,
    retention: Duration,
    max_entries: usize,
}

impl DedupIndex {
    /// Create an index with the given retention window and size bound.
    #[must_use]
    pub fn new(retention: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            retention,
            max_entries,
        }
    }

    fn key(channel: ChannelId, message: MessageId, content: &str) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        channel.value().hash(&mut hasher);
        message.value().hash(&mut hasher);
        content.hash(&mut hasher);
        hasher.finish()
    }

    /// Atomically record the message unless it was already seen within the
    /// retention window. Returns true when the message is fresh (caller
    /// should enqueue), false when it is a recent duplicate.
    pub fn insert_if_fresh(&self, channel: ChannelId, message: MessageId, content: &str) -> bool {
        let key = Self::key(channel, message, content);
        let now = Instant::now();
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                if now.duration_since(*entry.get()) < self.retention {
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Drop entries past the retention window, then enforce the size bound
    /// by evicting the oldest remainder. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries
            .retain(|_, seen| now.duration_since(*seen) < self.retention);

        if self.entries.len() > self.max_entries {
            let mut by_age: Vec<(u64, Instant)> = self
                .entries
                .iter()
                .map(|entry| (*entry.key(), *entry.value()))
                .collect();
            by_age.sort_by_key(|&(_, seen)| seen);
            let excess = by_age.len() - self.max_entries;
            for (key, _) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        before - self.entries.len()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(retention_ms: u64) -> DedupIndex {
        DedupIndex::new(Duration::from_millis(retention_ms), 1000)
    }

    #[test]
    fn second_insert_within_window_is_duplicate() {
        let dedup = index(60_000);
        let channel = ChannelId::new(1);
        let message = MessageId::new(10);

        assert!(dedup.insert_if_fresh(channel, message, "BUY EURUSD"));
        assert!(!dedup.insert_if_fresh(channel, message, "BUY EURUSD"));
    }

    #[test]
    fn different_content_same_id_is_fresh() {
        let dedup = index(60_000);
        let channel = ChannelId::new(1);
        let message = MessageId::new(10);

        assert!(dedup.insert_if_fresh(channel, message, "BUY EURUSD"));
        assert!(dedup.insert_if_fresh(channel, message, "BUY EURUSD SL 1.08"));
    }

    #[test]
    fn different_channels_do_not_collide() {
        let dedup = index(60_000);
        let message = MessageId::new(10);

        assert!(dedup.insert_if_fresh(ChannelId::new(1), message, "BUY EURUSD"));
        assert!(dedup.insert_if_fresh(ChannelId::new(2), message, "BUY EURUSD"));
    }

    #[test]
    fn entry_expires_after_retention() {
        let dedup = index(10);
        let channel = ChannelId::new(1);
        let message = MessageId::new(10);

        assert!(dedup.insert_if_fresh(channel, message, "BUY EURUSD"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(dedup.insert_if_fresh(channel, message, "BUY EURUSD"));
    }

    #[test]
    fn sweep_purges_stale_entries() {
        let dedup = index(10);
        for id in 0..5 {
            dedup.insert_if_fresh(ChannelId::new(1), MessageId::new(id), "text");
        }
        assert_eq!(dedup.len(), 5);

        std::thread::sleep(Duration::from_millis(20));
        let removed = dedup.sweep();
        assert_eq!(removed, 5);
        assert!(dedup.is_empty());
    }

    #[test]
    fn sweep_enforces_size_bound() {
        let dedup = DedupIndex::new(Duration::from_secs(600), 3);
        for id in 0..10 {
            dedup.insert_if_fresh(ChannelId::new(1), MessageId::new(id), "text");
        }

        dedup.sweep();
        assert_eq!(dedup.len(), 3);
    }
}
