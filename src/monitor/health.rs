//! Channel health classification and the periodic health/reconnection loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::ChannelHealth;
use crate::port::{Event, MessageSource, NotifierRegistry};

use super::reconnect::{ReconnectController, ReconnectDirective};
use super::state::{ChannelState, ChannelStateStore};
use super::MonitorConfig;

/// Classify a channel from its error and staleness counters.
///
/// Rules are ordered, first hit wins. Downgrades need threshold breaches:
/// a single failed poll or one quiet hour with no history never trips them.
#[must_use]
pub fn classify(state: &ChannelState, now: Instant) -> ChannelHealth {
    if state.consecutive_errors > 5 {
        return ChannelHealth::Critical;
    }
    if state.consecutive_errors > 2
        || now.duration_since(state.last_poll) > Duration::from_secs(5 * 60)
    {
        return ChannelHealth::Warning;
    }
    if state.message_count > 0
        && now.duration_since(state.last_message) > Duration::from_secs(60 * 60)
    {
        return ChannelHealth::Inactive;
    }
    ChannelHealth::Healthy
}

/// Periodic health check: probes the source, reclassifies channels and
/// drives reconnection with backoff when the probe fails.
pub(crate) struct HealthMonitor {
    pub source: Arc<dyn MessageSource>,
    pub store: Arc<ChannelStateStore>,
    pub notifier: Arc<NotifierRegistry>,
    pub config: MonitorConfig,
    /// Flipped off and used to stop the whole engine on exhaustion.
    pub active: Arc<AtomicBool>,
    pub shutdown_tx: Arc<watch::Sender<bool>>,
}

impl HealthMonitor {
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut controller = ReconnectController::new(self.config.reconnect_max_attempts);
        let mut tick =
            tokio::time::interval(Duration::from_secs(self.config.health_interval_secs));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // the first tick of a tokio interval fires immediately; skip it so
        // freshly-seeded channels are not classified before their first poll
        tick.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = tick.tick() => {
                    if !self.check(&mut controller, &mut shutdown).await {
                        break;
                    }
                }
            }
        }
        debug!("health monitor stopped");
    }

    /// One health pass. Returns false when monitoring must stop.
    async fn check(
        &self,
        controller: &mut ReconnectController,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        match self.source.probe().await {
            Ok(()) => {
                controller.on_success();
                self.reclassify();
                true
            }
            Err(error) => {
                self.notifier
                    .notify_all(Event::Error(format!("source probe failed: {error}")));
                self.reconnect(controller, shutdown).await
            }
        }
    }

    /// Walk the backoff ladder until the probe succeeds, shutdown is
    /// requested, or the attempts are exhausted.
    async fn reconnect(
        &self,
        controller: &mut ReconnectController,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        loop {
            match controller.on_failure() {
                ReconnectDirective::Retry { attempt, delay } => {
                    info!(
                        attempt,
                        max = self.config.reconnect_max_attempts,
                        delay_secs = delay.as_secs(),
                        "attempting reconnection after delay"
                    );
                    tokio::select! {
                        _ = shutdown.changed() => return false,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    match self.source.probe().await {
                        Ok(()) => {
                            controller.on_success();
                            info!("source reconnected, monitored channels restored");
                            self.notifier
                                .notify_all(Event::Debug("source reconnected".into()));
                            return true;
                        }
                        Err(error) => {
                            warn!(attempt, error = %error, "reconnection attempt failed");
                        }
                    }
                }
                ReconnectDirective::GiveUp => {
                    self.notifier.notify_all(Event::Error(
                        "reconnection attempts exhausted, stopping monitoring".into(),
                    ));
                    self.active.store(false, Ordering::SeqCst);
                    self.notifier.notify_all(Event::MonitoringStatusChanged {
                        active: false,
                        channel_count: 0,
                        reason: "reconnection attempts exhausted".into(),
                    });
                    let _ = self.shutdown_tx.send(true);
                    return false;
                }
            }
        }
    }

    /// Recompute health for every channel, emitting an event only on
    /// transitions.
    fn reclassify(&self) {
        let now = Instant::now();
        let transitions = self.store.map_states(|state| {
            let health = classify(state, now);
            if health != state.health {
                state.health = health;
                Some((state.id, state.name.clone(), health))
            } else {
                None
            }
        });

        for (channel_id, channel_name, health) in transitions {
            self.notifier.notify_all(Event::ChannelHealthChanged {
                channel_id,
                channel_name,
                health,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChannelId, ChannelPriority, ChannelSpec, MessageId};

    fn state() -> ChannelState {
        ChannelState::seed(
            ChannelSpec::new(ChannelId::new(1), "test", "handle", ChannelPriority::Medium),
            MessageId::ZERO,
            Instant::now(),
        )
    }

    #[test]
    fn fresh_channel_is_healthy() {
        assert_eq!(classify(&state(), Instant::now()), ChannelHealth::Healthy);
    }

    #[test]
    fn error_thresholds_escalate() {
        let mut s = state();
        s.consecutive_errors = 3;
        assert_eq!(classify(&s, Instant::now()), ChannelHealth::Warning);

        s.consecutive_errors = 6;
        assert_eq!(classify(&s, Instant::now()), ChannelHealth::Critical);
    }

    #[test]
    fn single_error_does_not_downgrade() {
        let mut s = state();
        s.consecutive_errors = 1;
        assert_eq!(classify(&s, Instant::now()), ChannelHealth::Healthy);
    }

    #[test]
    fn stale_poll_is_a_warning() {
        let s = state();
        let later = Instant::now() + Duration::from_secs(6 * 60);
        assert_eq!(classify(&s, later), ChannelHealth::Warning);
    }

    #[test]
    fn quiet_channel_with_history_goes_inactive() {
        let mut s = state();
        s.message_count = 10;
        s.last_poll = Instant::now() + Duration::from_secs(2 * 60 * 60);
        let later = Instant::now() + Duration::from_secs(2 * 60 * 60 + 30);
        assert_eq!(classify(&s, later), ChannelHealth::Inactive);
    }

    #[test]
    fn quiet_channel_without_history_stays_healthy() {
        let mut s = state();
        s.last_poll = Instant::now() + Duration::from_secs(2 * 60 * 60);
        let later = Instant::now() + Duration::from_secs(2 * 60 * 60 + 30);
        assert_eq!(classify(&s, later), ChannelHealth::Healthy);
    }

    use super::super::reconnect::ReconnectState;
    use crate::error::SourceError;
    use crate::port::NotifierRegistry;
    use crate::testkit::{RecordingNotifier, ScriptedSource};

    fn health_monitor(source: ScriptedSource) -> (HealthMonitor, RecordingNotifier) {
        let recorder = RecordingNotifier::new();
        let mut notifier = NotifierRegistry::new();
        notifier.register(Box::new(recorder.clone()));
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        let monitor = HealthMonitor {
            source: Arc::new(source),
            store: Arc::new(ChannelStateStore::new()),
            notifier: Arc::new(notifier),
            config: MonitorConfig::default(),
            active: Arc::new(AtomicBool::new(true)),
            shutdown_tx: Arc::new(shutdown_tx),
        };
        (monitor, recorder)
    }

    #[tokio::test]
    async fn probe_failure_recovers_after_one_backoff_rung() {
        let source = ScriptedSource::new().with_probes(vec![
            Err(SourceError::Connection("gone".into())),
            Ok(()),
        ]);
        let (monitor, recorder) = health_monitor(source);
        let (tx, mut rx) = watch::channel(false);
        let mut controller = ReconnectController::new(5);

        let started = Instant::now();
        let keep_running = monitor.check(&mut controller, &mut rx).await;
        drop(tx);

        assert!(keep_running);
        assert_eq!(controller.state(), ReconnectState::Connected);
        // one Error for the failed probe, one Debug for the recovery
        assert_eq!(recorder.error_count(), 1);
        // the first ladder rung is a one-second wait
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn healthy_probe_reclassifies_channels() {
        let source = ScriptedSource::new();
        let (monitor, recorder) = health_monitor(source);
        monitor.store.insert(state());
        let (tx, mut rx) = watch::channel(false);
        let mut controller = ReconnectController::new(5);

        assert!(monitor.check(&mut controller, &mut rx).await);
        drop(tx);

        // fresh channel moves Unknown -> Healthy exactly once
        let transitions = recorder.filtered(|event| {
            matches!(
                event,
                crate::port::Event::ChannelHealthChanged {
                    health: ChannelHealth::Healthy,
                    ..
                }
            )
        });
        assert_eq!(transitions.len(), 1);

        assert!(monitor.check(&mut controller, &mut rx).await);
        let after_second = recorder.filtered(|event| {
            matches!(event, crate::port::Event::ChannelHealthChanged { .. })
        });
        assert_eq!(after_second.len(), 1);
    }
}
