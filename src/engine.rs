//! Editor engine abstraction layer.
//!
//! This module defines the interface the external rich-text engine must
//! implement, along with the event and change types it reports. The engine
//! owns the document model and rendering; the session manager only drives it
//! through this surface.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::EditorConfig;

/// Common error types for engine operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("editor construction rejected: {0}")]
    Create(String),

    #[error("editor destroy failed: {0}")]
    Destroy(String),

    #[error("model mutation failed: {0}")]
    Mutation(String),

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

/// Identifier of a node inside the engine's document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// A single document model change reported by the engine.
#[derive(Debug, Clone)]
pub enum DocumentChange {
    /// A node was inserted into the model.
    Insert {
        node: NodeId,
        name: String,
        attributes: HashMap<String, String>,
    },
    /// A node was removed from the model.
    Delete { name: String },
    /// An attribute changed on an existing node.
    AttributeChange {
        node: NodeId,
        attribute: String,
        old: Option<String>,
        new: Option<String>,
    },
}

/// Event emitted by a live editor instance.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The document content changed.
    DocumentChanged { changes: Vec<DocumentChange> },
    /// The editing area gained or lost input focus.
    FocusChanged { focused: bool },
}

/// Cursor placement target for [`EditorHandle::set_selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPosition {
    /// Absolute offset within the target element.
    At(u32),
    Before,
    After,
    End,
}

/// Handle to a live editor instance owned by the external engine.
///
/// Handles are shared (`Arc`) so that teardown of many instances can be
/// issued concurrently without draining the registry first.
#[async_trait]
pub trait EditorHandle: Send + Sync {
    /// Serialized document content.
    async fn data(&self) -> String;

    /// Subscribe to document/focus events of this instance.
    fn events(&self) -> broadcast::Receiver<EngineEvent>;

    /// Whether the editing area currently has input focus.
    async fn is_focused(&self) -> bool;

    /// Set an attribute on a model node.
    async fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), EngineError>;

    /// Set a CSS style on the editable-area root.
    async fn set_editable_style(&self, name: &str, value: &str) -> Result<(), EngineError>;

    /// Place the text cursor relative to a node, or to the document root
    /// when `node` is `None`.
    async fn set_selection(&self, node: Option<NodeId>, position: CursorPosition) -> Result<(), EngineError>;

    /// Current height of the editable area in pixels.
    async fn editable_height(&self) -> f64;

    /// Show or hide the engine's badge affordance.
    async fn set_badge_visible(&self, visible: bool);

    /// Give the editing area input focus.
    async fn focus(&self);

    /// Tear the instance down. The handle must not be used afterwards.
    async fn destroy(&self) -> Result<(), EngineError>;
}

/// Engine trait that rich-text editor engines must implement.
///
/// This is the construction half of the collaborator surface; everything
/// else goes through the returned [`EditorHandle`].
#[async_trait]
pub trait EditorEngine: Send + Sync {
    /// Construct a new editor instance for the given configuration.
    async fn create(&self, config: EditorConfig) -> Result<Arc<dyn EditorHandle>, EngineError>;
}
