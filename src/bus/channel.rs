//! # Channel transport
//!
//! Contexts living in one process share a [`ChannelHub`], a tokio broadcast
//! channel. Each notifier tags its frames with its own origin and drops
//! frames carrying that origin on receipt. A subscriber that falls behind
//! the channel capacity receives a reset in place of the frames it missed.

use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};

use super::envelope::{ChangeEnvelope, Frame};
use super::errors::{BusError, BusResult};
use super::notifier::{EnvelopeReceiver, Notifier, Transport};

const HUB_CAPACITY: usize = 256;

/// Shared broadcast primitive. Clones refer to the same channel.
#[derive(Debug, Clone)]
pub struct ChannelHub {
    sender: broadcast::Sender<Frame>,
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelHub {
    pub fn new() -> Self {
        Self::with_capacity(HUB_CAPACITY)
    }

    /// A hub buffering at most `capacity` frames per lagging subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A notifier for one new context
    pub fn notifier(&self) -> ChannelNotifier {
        ChannelNotifier {
            hub: self.clone(),
            origin: Uuid::new_v4(),
        }
    }
}

#[derive(Debug)]
pub struct ChannelNotifier {
    hub: ChannelHub,
    origin: Uuid,
}

impl Notifier for ChannelNotifier {
    fn transport(&self) -> Transport {
        Transport::Channel
    }

    fn send(&self, envelope: ChangeEnvelope) {
        let operation = envelope.operation.as_str();
        // An error only means nobody is subscribed right now.
        let receivers = self
            .hub
            .sender
            .send(Frame::new(self.origin, envelope))
            .unwrap_or(0)
            .to_string();
        log_event_with_fields(
            Event::BusPublished,
            &[("operation", operation), ("receivers", receivers.as_str()), ("transport", "channel")],
        );
    }

    fn subscribe(&self) -> BusResult<EnvelopeReceiver> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BusError::NoRuntime)?;
        let mut frames = self.hub.sender.subscribe();
        let (tx, rx) = mpsc::unbounded_channel();
        let origin = self.origin;

        runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    received = frames.recv() => match received {
                        Ok(frame) if frame.origin == origin => continue,
                        Ok(frame) => {
                            log_event_with_fields(
                                Event::BusReceived,
                                &[("operation", frame.envelope.operation.as_str()), ("transport", "channel")],
                            );
                            if tx.send(frame.envelope).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            let missed = missed.to_string();
                            log_event_with_fields(
                                Event::BusReceiveFailed,
                                &[("missed", missed.as_str()), ("transport", "channel")],
                            );
                            if tx.send(ChangeEnvelope::reset()).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(rx)
    }
}
