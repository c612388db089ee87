//! # Notifier
//!
//! One interface, two interchangeable transports. Delivery is best-effort
//! and at-least-once to every other context; a context never receives its
//! own messages.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::observability::{log_event_with_fields, Event};

use super::channel::ChannelHub;
use super::envelope::{ChangeEnvelope, Operation};
use super::errors::{BusError, BusResult};
use super::keyfile::KeyFileNotifier;

/// Envelopes from other contexts, in arrival order
pub type EnvelopeReceiver = mpsc::UnboundedReceiver<ChangeEnvelope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// In-process broadcast between contexts sharing a [`ChannelHub`]
    Channel,
    /// Shared key file plus file-change events, across processes
    KeyFile,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Channel => "channel",
            Transport::KeyFile => "keyfile",
        }
    }
}

/// Configured transport preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportChoice {
    /// Channel when a hub is available, key file otherwise
    #[default]
    Auto,
    Channel,
    KeyFile,
}

pub trait Notifier: Send + Sync {
    fn transport(&self) -> Transport;

    /// Sends `envelope` to the other contexts. Failures are logged, never returned.
    fn send(&self, envelope: ChangeEnvelope);

    /// Starts receiving envelopes published by other contexts.
    fn subscribe(&self) -> BusResult<EnvelopeReceiver>;

    fn publish(&self, operation: Operation, data: Value) {
        self.send(ChangeEnvelope::new(operation, data));
    }
}

/// Picks a transport by capability: the native broadcast when a hub is
/// present, the key file under `data_dir` otherwise.
pub fn select_notifier(
    choice: TransportChoice,
    hub: Option<&ChannelHub>,
    data_dir: &Path,
) -> BusResult<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match (choice, hub) {
        (TransportChoice::Auto, Some(hub)) | (TransportChoice::Channel, Some(hub)) => {
            Arc::new(hub.notifier())
        }
        (TransportChoice::Channel, None) => {
            return Err(BusError::TransportUnavailable(
                "channel transport requested without a hub".to_string(),
            ))
        }
        (TransportChoice::Auto, None) | (TransportChoice::KeyFile, _) => {
            Arc::new(KeyFileNotifier::new(data_dir))
        }
    };

    log_event_with_fields(
        Event::BusTransportSelected,
        &[("transport", notifier.transport().as_str())],
    );
    Ok(notifier)
}
