//! End-to-end monitoring: source feed in, robot file lines out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sigrelay::domain::{ChannelHealth, SignalStatus};
use sigrelay::parser::SymbolMapper;
use sigrelay::port::Event;
use sigrelay::testkit::channel_feed;

mod support;

/// High-priority channels poll every three seconds when idle, so feeding a
/// message right after start means it lands on the second poll.
const SETTLE: Duration = Duration::from_millis(4500);

#[tokio::test]
async fn signals_flow_from_feed_to_file() {
    let (source, feed) = channel_feed();
    let harness = support::harness(Arc::new(source), SymbolMapper::default());

    harness
        .monitor
        .start(vec![support::channel(1001, "majors vip", "peer:1001")])
        .await
        .unwrap();
    assert!(harness.monitor.is_active());

    feed.push("peer:1001", 1, "BUY EURUSD SL 1.0860 TP1 1.0920 TP2 1.0950");
    feed.push("peer:1001", 2, "good luck everyone");
    tokio::time::sleep(SETTLE).await;

    let lines = support::data_lines(&harness.output);
    assert_eq!(lines.len(), 1, "only the signal message produces a line");
    let fields: Vec<&str> = lines[0].split('|').collect();
    assert_eq!(fields[1], "1001");
    assert_eq!(fields[2], "majors vip");
    assert_eq!(fields[3], "BUY");
    assert_eq!(fields[4], "EURUSD");
    assert_eq!(fields[6], "1.08600");
    assert_eq!(fields[10], "NEW");

    let history = harness.monitor.history();
    assert_eq!(history.len(), 2);
    let statuses: Vec<SignalStatus> = history.iter().map(|r| r.status).collect();
    assert!(statuses.contains(&SignalStatus::Delivered));
    assert!(statuses.contains(&SignalStatus::NoSignal));

    harness.monitor.stop().await;
    assert!(!harness.monitor.is_active());

    let status_events = harness.recorder.filtered(|event| {
        matches!(event, Event::MonitoringStatusChanged { .. })
    });
    assert_eq!(status_events.len(), 2);
    assert!(matches!(
        status_events[0],
        Event::MonitoringStatusChanged { active: true, channel_count: 1, .. }
    ));
    assert!(matches!(
        status_events[1],
        Event::MonitoringStatusChanged { active: false, .. }
    ));
}

#[tokio::test]
async fn messages_from_before_start_are_not_replayed() {
    let (source, feed) = channel_feed();
    feed.push("peer:1", 1, "BUY EURUSD SL 1.0860 TP 1.0920");
    feed.push("peer:1", 2, "SELL GBPUSD SL 1.2700 TP 1.2600");

    let harness = support::harness(Arc::new(source), SymbolMapper::default());
    harness
        .monitor
        .start(vec![support::channel(1, "majors", "peer:1")])
        .await
        .unwrap();

    // only messages arriving after start may be delivered
    feed.push("peer:1", 3, "BUY USDJPY SL 149.00 TP 151.00");
    tokio::time::sleep(SETTLE).await;
    harness.monitor.stop().await;

    let lines = support::data_lines(&harness.output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("|USDJPY|"));
}

#[tokio::test]
async fn repeated_message_is_delivered_once() {
    let (source, feed) = channel_feed();
    let harness = support::harness(Arc::new(source), SymbolMapper::default());

    harness
        .monitor
        .start(vec![support::channel(7, "gold", "peer:7")])
        .await
        .unwrap();

    // identical signal twice under different message ids: the writer's
    // signature scan suppresses the second line
    feed.push("peer:7", 1, "GOLD BUY NOW 3342 SL 3330 TP 3360");
    feed.push("peer:7", 2, "GOLD BUY NOW 3342 SL 3330 TP 3360");
    tokio::time::sleep(SETTLE).await;
    harness.monitor.stop().await;

    assert_eq!(support::data_lines(&harness.output).len(), 1);

    let duplicates: Vec<SignalStatus> = harness
        .monitor
        .history()
        .iter()
        .map(|record| record.status)
        .filter(|status| *status == SignalStatus::Duplicate)
        .collect();
    assert_eq!(duplicates.len(), 1);
}

#[tokio::test]
async fn excluded_symbol_is_recorded_and_reported() {
    let (source, feed) = channel_feed();
    let mapper = SymbolMapper::new(
        HashMap::new(),
        "",
        "",
        [],
        ["USDTRY".to_string()],
        [],
    );
    let harness = support::harness(Arc::new(source), mapper);

    harness
        .monitor
        .start(vec![support::channel(3, "exotics", "peer:3")])
        .await
        .unwrap();

    feed.push("peer:3", 1, "BUY USDTRY SL 32.10 TP 33.50");
    tokio::time::sleep(SETTLE).await;
    harness.monitor.stop().await;

    assert!(support::data_lines(&harness.output).is_empty());

    let history = harness.monitor.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, SignalStatus::Rejected);
    assert!(history[0].error.as_deref().unwrap_or("").contains("USDTRY"));
    assert!(harness.recorder.error_count() >= 1);
}

#[tokio::test]
async fn statuses_track_monitored_channels() {
    let (source, _feed) = channel_feed();
    let harness = support::harness(Arc::new(source), SymbolMapper::default());

    harness
        .monitor
        .start(vec![
            support::channel(1, "alpha", "peer:1"),
            support::channel(2, "beta", "peer:2"),
        ])
        .await
        .unwrap();

    let statuses = harness.monitor.statuses();
    assert_eq!(statuses.len(), 2);
    assert!(statuses
        .iter()
        .all(|status| status.health == ChannelHealth::Unknown));

    harness.monitor.stop().await;
    assert!(harness.monitor.statuses().is_empty());
}

#[tokio::test]
async fn restart_reuses_the_engine() {
    let (source, feed) = channel_feed();
    let harness = support::harness(Arc::new(source), SymbolMapper::default());

    harness
        .monitor
        .start(vec![support::channel(1, "majors", "peer:1")])
        .await
        .unwrap();
    harness.monitor.stop().await;

    // second run truncates the file again and picks up new messages
    harness
        .monitor
        .start(vec![support::channel(1, "majors", "peer:1")])
        .await
        .unwrap();
    feed.push("peer:1", 1, "SELL EURUSD SL 1.0950 TP 1.0850");
    tokio::time::sleep(SETTLE).await;
    harness.monitor.stop().await;

    let lines = support::data_lines(&harness.output);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("|SELL|EURUSD|"));
}
