//! Session notifications.
//!
//! The session manager is publish-only: every notification is broadcast to
//! whoever subscribed, and dropped silently when nobody did. Event names are
//! stable and part of the public contract.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Notification published by the session manager.
#[derive(Debug, Clone)]
pub enum EditorEvent {
    /// An editor instance finished construction and is registered.
    InstanceReady { field_id: String, instance_id: Uuid },
    /// Construction failed; nothing was registered.
    InstanceCreateError { field_id: String, error: String },
    /// The document content of an instance changed.
    ContentChanged { field_id: String },
    /// The debounced validation pass ran for an instance.
    ValidationComplete { field_id: String },
    /// The editing area gained input focus.
    Focus { field_id: String },
    /// The editing area lost input focus.
    Blur { field_id: String },
}

/// Publish-only event bus backed by a broadcast channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all subsequently published events.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    pub(crate) fn publish(&self, event: EditorEvent) {
        // A send error only means nobody is listening right now.
        let _ = self.tx.send(event);
    }
}
