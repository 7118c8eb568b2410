//! Source-agnostic domain types: identifiers, channels, messages, signals
//! and processing records.

pub mod channel;
pub mod id;
pub mod message;
pub mod record;
pub mod signal;

pub use channel::{ChannelHealth, ChannelPriority, ChannelSpec, ChannelStatus};
pub use id::{ChannelHandle, ChannelId, MessageId};
pub use message::PendingMessage;
pub use record::{SignalRecord, SignalStatus};
pub use signal::{Direction, OrderType, ParsedSignal};
