//! # Change Notification Bus
//!
//! Tells other contexts sharing a data directory that points changed.
//! Messages only say "re-read": the store stays the source of truth, so
//! lost or duplicated messages are tolerated.

mod channel;
mod envelope;
mod errors;
mod keyfile;
mod notifier;

pub use channel::{ChannelHub, ChannelNotifier};
pub use envelope::{ChangeEnvelope, Operation};
pub use errors::{BusError, BusResult};
pub use keyfile::{KeyFileNotifier, BUS_DIR, KEY_FILE};
pub use notifier::{select_notifier, EnvelopeReceiver, Notifier, Transport, TransportChoice};
