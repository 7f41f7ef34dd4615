//! Bridges engine events of a live instance back into its bound field.
//!
//! One bridge task runs per instance. It mirrors serialized content into
//! the field value, assigns the default alignment to freshly inserted
//! images, and schedules the debounced validation pass so validation runs
//! once after a burst of edits rather than on every keystroke.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::warn;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::constants::{DEFAULT_IMAGE_ALIGNMENT, IMAGE_BLOCK_ELEMENT, IMAGE_STYLE_ATTRIBUTE, VALIDATION_DEBOUNCE_MS};
use crate::engine::{DocumentChange, EditorHandle, EngineEvent};
use crate::events::{EditorEvent, EventBus};
use crate::field::FormField;

/// Runs an action once per burst of triggers, after a fixed quiet window.
///
/// Every trigger restarts the window, so the action fires only after input
/// settles.
pub struct Debouncer {
    delay: Duration,
    action: Arc<dyn Fn() + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration, action: Arc<dyn Fn() + Send + Sync>) -> Self {
        Self {
            delay,
            action,
            pending: Mutex::new(None),
        }
    }

    /// Restart the quiet window; the action fires once it elapses untriggered.
    pub fn trigger(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }

            let action = Arc::clone(&self.action);
            let delay = self.delay;
            *pending = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                action();
            }));
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(handle) = pending.take() {
                handle.abort();
            }
        }
    }
}

/// Spawn the event bridge for one live instance.
///
/// The task ends when the engine closes its event channel; the session
/// manager aborts it when the instance is destroyed.
pub(crate) fn spawn_bridge(
    field: Arc<dyn FormField>,
    handle: Arc<dyn EditorHandle>,
    events: EventBus,
) -> JoinHandle<()> {
    let mut engine_events = handle.events();

    tokio::spawn(async move {
        let debouncer = {
            let field = Arc::clone(&field);
            let events = events.clone();
            let field_id = field.id().to_string();
            Debouncer::new(
                Duration::from_millis(VALIDATION_DEBOUNCE_MS),
                Arc::new(move || {
                    field.validate();
                    events.publish(EditorEvent::ValidationComplete {
                        field_id: field_id.clone(),
                    });
                }),
            )
        };

        loop {
            match engine_events.recv().await {
                Ok(EngineEvent::DocumentChanged { changes }) => {
                    // Skip the sync when serialization is empty so the
                    // field's placeholder state is not clobbered.
                    let data = handle.data().await;
                    if !data.is_empty() {
                        field.set_value(&data);
                    }

                    for change in changes {
                        match change {
                            DocumentChange::Insert { node, name, attributes } => {
                                if name == IMAGE_BLOCK_ELEMENT
                                    && !attributes.contains_key(IMAGE_STYLE_ATTRIBUTE)
                                {
                                    if let Err(e) = handle
                                        .set_attribute(node, IMAGE_STYLE_ATTRIBUTE, DEFAULT_IMAGE_ALIGNMENT)
                                        .await
                                    {
                                        warn!("Failed to align inserted image in '{}': {e}", field.id());
                                    }
                                }
                            }
                            DocumentChange::Delete { .. } => {}
                            DocumentChange::AttributeChange { .. } => {}
                        }
                    }

                    events.publish(EditorEvent::ContentChanged {
                        field_id: field.id().to_string(),
                    });
                    debouncer.trigger();
                }
                Ok(EngineEvent::FocusChanged { focused: false }) => {
                    // Force a sync on focus loss, then validate unless the
                    // field is already flagged erroneous.
                    field.set_value(&handle.data().await);
                    if !field.has_error() {
                        field.validate();
                    }
                    field.clear_error_tooltip();
                    events.publish(EditorEvent::Blur {
                        field_id: field.id().to_string(),
                    });
                }
                Ok(EngineEvent::FocusChanged { focused: true }) => {
                    events.publish(EditorEvent::Focus {
                        field_id: field.id().to_string(),
                    });
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Editor event stream for '{}' lagged, {skipped} event(s) dropped", field.id());
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
