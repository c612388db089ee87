//! # Key-file transport
//!
//! Publishing replaces `<data_dir>/bus/changes.json` with the latest frame
//! (temporary file plus rename). Subscribers watch the bus directory for
//! file-change events and read the frame back. There is no polling: the
//! platform's native change notification wakes subscribers.

use std::fs;
use std::path::{Path, PathBuf};

use notify::{Config as NotifyConfig, Event as FsEvent, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};

use super::envelope::{ChangeEnvelope, Frame};
use super::errors::{BusError, BusResult};
use super::notifier::{EnvelopeReceiver, Notifier, Transport};

pub const BUS_DIR: &str = "bus";
pub const KEY_FILE: &str = "changes.json";

#[derive(Debug)]
pub struct KeyFileNotifier {
    dir: PathBuf,
    origin: Uuid,
}

impl KeyFileNotifier {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(BUS_DIR),
            origin: Uuid::new_v4(),
        }
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    fn write_frame(&self, frame: &Frame) -> Result<(), String> {
        fs::create_dir_all(&self.dir).map_err(|e| e.to_string())?;
        let json = serde_json::to_vec(frame).map_err(|e| e.to_string())?;
        let tmp = self.dir.join(format!(".{}.{}", KEY_FILE, frame.id));
        fs::write(&tmp, json).map_err(|e| e.to_string())?;
        fs::rename(&tmp, self.key_path()).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            e.to_string()
        })
    }
}

fn read_frame(path: &Path) -> Option<Frame> {
    let content = fs::read(path).ok()?;
    serde_json::from_slice(&content).ok()
}

fn touches_key_file(event: &FsEvent) -> bool {
    event.paths.is_empty()
        || event
            .paths
            .iter()
            .any(|p| p.file_name().map_or(false, |name| name == KEY_FILE))
}

impl Notifier for KeyFileNotifier {
    fn transport(&self) -> Transport {
        Transport::KeyFile
    }

    fn send(&self, envelope: ChangeEnvelope) {
        let operation = envelope.operation.as_str();
        match self.write_frame(&Frame::new(self.origin, envelope)) {
            Ok(()) => log_event_with_fields(
                Event::BusPublished,
                &[("operation", operation), ("transport", "keyfile")],
            ),
            Err(reason) => log_event_with_fields(
                Event::BusPublishFailed,
                &[("operation", operation), ("reason", reason.as_str()), ("transport", "keyfile")],
            ),
        }
    }

    fn subscribe(&self) -> BusResult<EnvelopeReceiver> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BusError::NoRuntime)?;
        fs::create_dir_all(&self.dir)?;

        let (fs_tx, mut fs_rx) = mpsc::unbounded_channel::<notify::Result<FsEvent>>();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = fs_tx.send(res);
            },
            NotifyConfig::default(),
        )?;
        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let origin = self.origin;
        let key_path = self.key_path();
        // Whatever is already in the key file predates this subscription.
        let mut last_seen = read_frame(&key_path).map(|frame| frame.id);

        runtime.spawn(async move {
            let _watcher = watcher;
            loop {
                let event = tokio::select! {
                    _ = tx.closed() => break,
                    event = fs_rx.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };

                match event {
                    Ok(event) if touches_key_file(&event) => {}
                    Ok(_) => continue,
                    Err(e) => {
                        let reason = e.to_string();
                        log_event_with_fields(
                            Event::BusReceiveFailed,
                            &[("reason", reason.as_str()), ("transport", "keyfile")],
                        );
                        continue;
                    }
                }

                // One write raises several events; deliver each frame once.
                let frame = match read_frame(&key_path) {
                    Some(frame) if Some(frame.id) != last_seen => frame,
                    _ => continue,
                };
                last_seen = Some(frame.id);
                if frame.origin == origin {
                    continue;
                }

                log_event_with_fields(
                    Event::BusReceived,
                    &[("operation", frame.envelope.operation.as_str()), ("transport", "keyfile")],
                );
                if tx.send(frame.envelope).is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Operation;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_publish_replaces_key_file() {
        let temp_dir = TempDir::new().unwrap();
        let notifier = KeyFileNotifier::new(temp_dir.path());

        notifier.send(ChangeEnvelope::reset());
        let first = read_frame(&notifier.key_path()).unwrap();
        notifier.publish(Operation::Delete, serde_json::json!({"id": 2}));
        let second = read_frame(&notifier.key_path()).unwrap();

        assert_eq!(first.envelope.operation, Operation::Reset);
        assert_eq!(second.envelope.operation, Operation::Delete);
        assert_ne!(first.id, second.id);
        assert_eq!(first.origin, second.origin);

        let leftovers = fs::read_dir(temp_dir.path().join(BUS_DIR)).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[tokio::test]
    async fn test_other_context_receives_change() {
        let temp_dir = TempDir::new().unwrap();
        let publisher = KeyFileNotifier::new(temp_dir.path());
        let subscriber = KeyFileNotifier::new(temp_dir.path());

        let mut own_rx = publisher.subscribe().unwrap();
        let mut rx = subscriber.subscribe().unwrap();

        publisher.send(ChangeEnvelope::reset());

        let envelope = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(envelope.operation, Operation::Reset);

        let own = tokio::time::timeout(Duration::from_millis(300), own_rx.recv()).await;
        assert!(own.is_err());
    }
}
