//! sigrelay - turns free-text trading-signal messages into structured order
//! instructions for an external trading robot.
//!
//! The engine polls many independently-updating message channels through a
//! narrow source adapter, detects embedded trading signals with a heuristic
//! parser, and appends normalized order lines to a shared file the robot
//! tails — at most once per signal per time window, and without falling
//! over when individual channels misbehave.
//!
//! # Architecture
//!
//! Hexagonal: the core owns scheduling, parsing and delivery; the transport
//! and the user-visible surface stay outside, injected through ports.
//!
//! - [`domain`] - identifiers, channel state types, signals, records
//! - [`port`] - the [`port::MessageSource`] seam and the [`port::Notifier`]
//!   event sink
//! - [`parser`] - ordered format extractors, price extraction, symbol
//!   mapping and the validation gate
//! - [`monitor`] - adaptive poll scheduler, health classifier, dedup index,
//!   processing worker and reconnection backoff
//! - [`writer`] - duplicate-suppressing append-only file writer
//! - [`history`] - capped processed-record history with JSON snapshots
//! - [`config`] - TOML configuration with validation
//! - [`testkit`] - scripted port implementations (requires the `testkit`
//!   feature)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sigrelay::config::Config;
//! use sigrelay::monitor::ChannelMonitor;
//! use sigrelay::parser::SignalParser;
//! use sigrelay::port::{LogNotifier, MessageSource, NotifierRegistry};
//!
//! # async fn run(source: Arc<dyn MessageSource>) -> sigrelay::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! config.init_logging();
//!
//! let mut notifiers = NotifierRegistry::new();
//! notifiers.register(Box::new(LogNotifier));
//!
//! let monitor = ChannelMonitor::new(
//!     source,
//!     Arc::new(notifiers),
//!     SignalParser::new(config.symbols.mapper()),
//!     config.output.writer(),
//!     config.history.store(),
//!     config.monitor.clone(),
//! );
//! monitor.start(config.channel_specs()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod monitor;
pub mod parser;
pub mod port;
pub mod writer;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
