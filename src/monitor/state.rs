//! Per-channel monitoring state and its store.

use std::time::Instant;

use dashmap::DashMap;

use crate::domain::{
    ChannelHandle, ChannelHealth, ChannelId, ChannelPriority, ChannelSpec, ChannelStatus, MessageId,
};

/// Mutable monitoring state for one channel.
///
/// Owned exclusively by whichever poll currently holds the channel: the
/// scheduler removes the state from the store for the duration of a poll
/// and puts it back afterwards, so no per-field locking is needed.
#[derive(Debug, Clone)]
pub struct ChannelState {
    pub id: ChannelId,
    pub name: String,
    pub handle: ChannelHandle,
    pub priority: ChannelPriority,
    /// Highest message id already processed; never decreases.
    pub cursor: MessageId,
    pub last_poll: Instant,
    pub last_message: Instant,
    /// Messages accepted since monitoring started.
    pub message_count: u64,
    pub consecutive_empty_polls: u32,
    pub consecutive_errors: u32,
    /// Messages per minute over the trailing five-minute window.
    pub recent_message_rate: f64,
    pub health: ChannelHealth,
}

impl ChannelState {
    /// Seed state for a channel at monitoring start.
    ///
    /// The cursor starts at the latest visible message so history from
    /// before this run is never replayed.
    #[must_use]
    pub fn seed(spec: ChannelSpec, cursor: MessageId, now: Instant) -> Self {
        Self {
            id: spec.id,
            name: spec.name,
            handle: spec.handle,
            priority: spec.priority,
            cursor,
            last_poll: now,
            last_message: now,
            message_count: 0,
            consecutive_empty_polls: 0,
            consecutive_errors: 0,
            recent_message_rate: 0.0,
            health: ChannelHealth::Unknown,
        }
    }

    /// Advance the cursor, keeping it monotonic.
    pub fn advance_cursor(&mut self, seen: MessageId) {
        if seen > self.cursor {
            self.cursor = seen;
        }
    }

    /// Observability snapshot.
    #[must_use]
    pub fn status(&self) -> ChannelStatus {
        ChannelStatus {
            id: self.id,
            name: self.name.clone(),
            priority: self.priority,
            health: self.health,
            message_count: self.message_count,
            message_rate: self.recent_message_rate,
            consecutive_errors: self.consecutive_errors,
        }
    }
}

/// Concurrent store of channel states.
///
/// Polls *take* a state out and *restore* it when done, which both keeps the
/// single-writer discipline and makes "already being polled" naturally
/// unobservable to the next tick.
#[derive(Default)]
pub struct ChannelStateStore {
    channels: DashMap<ChannelId, ChannelState>,
}

impl ChannelStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, state: ChannelState) {
        self.channels.insert(state.id, state);
    }

    pub fn clear(&self) {
        self.channels.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Remove and return up to `limit` channels that are due for polling,
    /// highest priority first, then longest-waiting.
    pub fn take_due(
        &self,
        now: Instant,
        limit: usize,
        interval: impl Fn(&ChannelState) -> std::time::Duration,
    ) -> Vec<ChannelState> {
        let mut due: Vec<(ChannelId, ChannelPriority, Instant)> = self
            .channels
            .iter()
            .filter(|entry| now.duration_since(entry.last_poll) >= interval(entry.value()))
            .map(|entry| (entry.id, entry.priority, entry.last_poll))
            .collect();

        due.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        due.truncate(limit);

        due.into_iter()
            .filter_map(|(id, _, _)| self.channels.remove(&id).map(|(_, state)| state))
            .collect()
    }

    /// Put a polled state back.
    pub fn restore(&self, state: ChannelState) {
        self.channels.insert(state.id, state);
    }

    /// Apply `f` to every resident state, collecting the results.
    pub fn map_states<T>(&self, mut f: impl FnMut(&mut ChannelState) -> Option<T>) -> Vec<T> {
        self.channels
            .iter_mut()
            .filter_map(|mut entry| f(entry.value_mut()))
            .collect()
    }

    /// Snapshot of every channel's status.
    #[must_use]
    pub fn statuses(&self) -> Vec<ChannelStatus> {
        self.channels.iter().map(|entry| entry.status()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn spec(id: i64, priority: ChannelPriority) -> ChannelSpec {
        ChannelSpec::new(
            ChannelId::new(id),
            format!("channel-{id}"),
            format!("handle-{id}"),
            priority,
        )
    }

    #[test]
    fn cursor_is_monotonic() {
        let now = Instant::now();
        let mut state = ChannelState::seed(spec(1, ChannelPriority::Medium), MessageId::new(10), now);

        state.advance_cursor(MessageId::new(15));
        assert_eq!(state.cursor, MessageId::new(15));

        state.advance_cursor(MessageId::new(12));
        assert_eq!(state.cursor, MessageId::new(15));
    }

    #[test]
    fn take_due_orders_by_priority_then_wait() {
        let store = ChannelStateStore::new();
        let base = Instant::now() - Duration::from_secs(60);

        let mut low = ChannelState::seed(spec(1, ChannelPriority::Low), MessageId::ZERO, base);
        low.last_poll = base;
        let mut high = ChannelState::seed(spec(2, ChannelPriority::High), MessageId::ZERO, base);
        high.last_poll = base + Duration::from_secs(10);
        let mut high_older =
            ChannelState::seed(spec(3, ChannelPriority::High), MessageId::ZERO, base);
        high_older.last_poll = base;

        store.insert(low);
        store.insert(high);
        store.insert(high_older);

        let due = store.take_due(Instant::now(), 10, |_| Duration::from_secs(1));
        let ids: Vec<i64> = due.iter().map(|s| s.id.value()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(store.is_empty());
    }

    #[test]
    fn take_due_respects_batch_limit() {
        let store = ChannelStateStore::new();
        let base = Instant::now() - Duration::from_secs(60);
        for id in 0..15 {
            let mut state =
                ChannelState::seed(spec(id, ChannelPriority::Medium), MessageId::ZERO, base);
            state.last_poll = base;
            store.insert(state);
        }

        let due = store.take_due(Instant::now(), 10, |_| Duration::from_secs(1));
        assert_eq!(due.len(), 10);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn take_due_skips_recently_polled() {
        let store = ChannelStateStore::new();
        let state = ChannelState::seed(
            spec(1, ChannelPriority::High),
            MessageId::ZERO,
            Instant::now(),
        );
        store.insert(state);

        let due = store.take_due(Instant::now(), 10, |_| Duration::from_secs(5));
        assert!(due.is_empty());
        assert_eq!(store.len(), 1);
    }
}
