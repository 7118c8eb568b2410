//! Trait seams between the engine core and the embedding application.
//!
//! - [`source`] — where messages come from (the transport seam).
//! - [`notifier`] — where events go (the injected sink).

pub mod notifier;
pub mod source;

pub use notifier::{Event, LogNotifier, Notifier, NotifierRegistry, NullNotifier};
pub use source::{MessageSource, SourceMessage};
