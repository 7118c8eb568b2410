//! Test doubles for the engine's ports.
//!
//! Compiled only with the `testkit` feature; the integration tests enable
//! it through the dev-dependency on this crate.

pub mod notifier;
pub mod source;

pub use notifier::RecordingNotifier;
pub use source::{channel_feed, ChannelFeedHandle, ChannelFeedSource, ScriptedSource};
