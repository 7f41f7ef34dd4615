//! Editor session management.
//!
//! The [`SessionManager`] owns the instance registry: it creates, tracks
//! and destroys editor instances bound to form fields, and is the only
//! component mutating registry state. It is `Clone` and cheap to share;
//! clones operate on the same registry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::{broadcast, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use uuid::Uuid;

use crate::bridge;
use crate::config::{Config, EditorConfig};
use crate::constants::{EVENT_CHANNEL_CAPACITY, INJECTED_STYLE_CLASS_PREFIX};
use crate::engine::{CursorPosition, EditorEngine, EditorHandle, EngineError, NodeId};
use crate::events::{EditorEvent, EventBus};
use crate::field::FormField;
use crate::providers::{
    self, CompletionBackend, CompletionCandidate, CompletionContext, CompletionGroup, MentionKind, ProviderError,
};
use crate::resize::ResizeSession;

/// Common error types for session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The target could not be resolved to exactly one editor field.
    #[error("need exactly one editor field, got an empty field id")]
    InvalidTarget,

    #[error("field '{0}' is already bound to an editor instance")]
    AlreadyBound(String),

    #[error("an editor instance for field '{0}' is still loading")]
    CreateInProgress(String),

    #[error("no editor instance registered for field '{0}'")]
    NotFound(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Identity of a live instance as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub field_id: String,
    pub instance_id: Uuid,
}

/// A live editor binding for one form field.
struct EditorInstance {
    id: Uuid,
    field: Arc<dyn FormField>,
    handle: Arc<dyn EditorHandle>,
    bridge: JoinHandle<()>,
    resize: Option<ResizeSession>,
}

/// Results of destroying every registered instance.
///
/// Completion is reported only after every attempt has resolved; failed
/// entries stay registered.
#[derive(Debug, Default)]
pub struct DestroyResults {
    pub destroyed: Vec<String>,
    pub failed: HashMap<String, EngineError>,
}

impl DestroyResults {
    pub fn total_attempted(&self) -> usize {
        self.destroyed.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

static INJECTED_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?s)<style class="{INJECTED_STYLE_CLASS_PREFIX}[^"]*">.*?</style>"#
    ))
    .expect("static pattern")
});

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+|&nbsp;|</?\w+[^>]*/?>").expect("static pattern"));

/// Remove style blocks a previous editor generation injected into the
/// field content.
fn strip_injected_styles(content: &str) -> String {
    INJECTED_STYLE_RE.replace_all(content, "").into_owned()
}

/// Whether serialized content is only whitespace and empty markup, with no
/// image element.
fn is_effectively_empty(data: &str) -> bool {
    MARKUP_RE.replace_all(data, "").is_empty() && !data.contains("<img")
}

/// Session manager owning the editor instance registry.
#[derive(Clone)]
pub struct SessionManager {
    config: Config,
    engine: Arc<dyn EditorEngine>,
    completion: Arc<dyn CompletionBackend>,
    instances: Arc<Mutex<HashMap<String, EditorInstance>>>,
    loading: Arc<Mutex<HashSet<String>>>,
    groups: Arc<Mutex<Vec<CompletionGroup>>>,
    events: EventBus,
}

impl SessionManager {
    /// Create a new session manager over an engine and a completion backend.
    pub fn new(config: Config, engine: Arc<dyn EditorEngine>, completion: Arc<dyn CompletionBackend>) -> Self {
        Self {
            config,
            engine,
            completion,
            instances: Arc::new(Mutex::new(HashMap::new())),
            loading: Arc::new(Mutex::new(HashSet::new())),
            groups: Arc::new(Mutex::new(Vec::new())),
            events: EventBus::new(EVENT_CHANNEL_CAPACITY),
        }
    }

    /// Subscribe to session notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Create an editor instance bound to the given field.
    ///
    /// Refused synchronously, without contacting the engine, when the field
    /// id is empty or the field already has a live or loading instance.
    /// Completion groups are resolved before construction so the engine
    /// sees a complete provider list.
    pub async fn create_editor(&self, field: Arc<dyn FormField>) -> Result<InstanceInfo, SessionError> {
        let field_id = field.id().to_string();
        if field_id.is_empty() {
            return Err(SessionError::InvalidTarget);
        }

        if self.instances.lock().await.contains_key(&field_id) {
            return Err(SessionError::AlreadyBound(field_id));
        }
        if !self.loading.lock().await.insert(field_id.clone()) {
            return Err(SessionError::CreateInProgress(field_id));
        }

        let result = self.build_and_register(&field_id, field).await;
        self.loading.lock().await.remove(&field_id);

        match result {
            Ok(info) => {
                info!("Editor instance {} ready for field '{field_id}'", info.instance_id);
                self.events.publish(EditorEvent::InstanceReady {
                    field_id,
                    instance_id: info.instance_id,
                });
                Ok(info)
            }
            Err(e) => {
                error!("Failed to create editor instance for field '{field_id}': {e}");
                self.events.publish(EditorEvent::InstanceCreateError {
                    field_id,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn build_and_register(&self, field_id: &str, field: Arc<dyn FormField>) -> Result<InstanceInfo, SessionError> {
        let groups = self.assemble_completion_groups().await;
        *self.groups.lock().await = groups.clone();

        let initial_data = strip_injected_styles(&field.value());
        field.set_value(&initial_data);

        let editor_config = EditorConfig::build(
            &self.config,
            field_id,
            initial_data,
            field.upload_form_id().as_deref(),
            groups,
        );

        let handle = self.engine.create(editor_config).await?;

        for (name, value) in [
            ("width", &self.config.editor.width),
            ("height", &self.config.editor.height),
            ("min-height", &self.config.editor.min_height),
        ] {
            if let Some(value) = value {
                handle.set_editable_style(name, value).await?;
            }
        }

        let bridge = bridge::spawn_bridge(Arc::clone(&field), Arc::clone(&handle), self.events.clone());

        let instance = EditorInstance {
            id: Uuid::new_v4(),
            field,
            handle,
            bridge,
            resize: None,
        };
        let info = InstanceInfo {
            field_id: field_id.to_string(),
            instance_id: instance.id,
        };
        self.instances.lock().await.insert(field_id.to_string(), instance);

        Ok(info)
    }

    /// Resolve the completion groups for a new instance: generic
    /// autocompletion triggers from the remote settings lookup, then the
    /// configured mention triggers.
    async fn assemble_completion_groups(&self) -> Vec<CompletionGroup> {
        let mut groups = Vec::new();

        match self.completion.autocompletion_settings().await {
            Ok(settings) => groups.extend(providers::autocompletion_groups(&settings)),
            Err(e) => warn!("Autocompletion settings lookup failed, continuing without autocompletion: {e}"),
        }

        groups.extend(providers::mention_groups(&self.config.mentions));
        groups
    }

    /// Destroy the instance bound to a field.
    ///
    /// An unregistered field id is rejected synchronously without an engine
    /// round-trip. On engine failure the registry entry is left untouched.
    pub async fn destroy_instance(&self, field_id: &str) -> Result<(), SessionError> {
        let handle = {
            let instances = self.instances.lock().await;
            match instances.get(field_id) {
                Some(instance) => Arc::clone(&instance.handle),
                None => return Err(SessionError::NotFound(field_id.to_string())),
            }
        };

        match handle.destroy().await {
            Ok(()) => {
                if let Some(instance) = self.instances.lock().await.remove(field_id) {
                    instance.bridge.abort();
                }
                info!("Destroyed editor instance for field '{field_id}'");
                Ok(())
            }
            Err(e) => {
                error!("Failed to destroy editor instance for field '{field_id}': {e}");
                Err(SessionError::Engine(e))
            }
        }
    }

    /// Destroy every registered instance.
    ///
    /// All destroy requests are issued before any is awaited; individual
    /// failures do not prevent the other attempts.
    pub async fn destroy_all_instances(&self) -> DestroyResults {
        let handles: Vec<(String, Arc<dyn EditorHandle>)> = {
            let instances = self.instances.lock().await;
            instances
                .iter()
                .map(|(field_id, instance)| (field_id.clone(), Arc::clone(&instance.handle)))
                .collect()
        };

        let mut attempts = JoinSet::new();
        for (field_id, handle) in handles {
            attempts.spawn(async move { (field_id, handle.destroy().await) });
        }

        let mut results = DestroyResults::default();
        while let Some(joined) = attempts.join_next().await {
            let Ok((field_id, outcome)) = joined else { continue };
            match outcome {
                Ok(()) => {
                    if let Some(instance) = self.instances.lock().await.remove(&field_id) {
                        instance.bridge.abort();
                    }
                    results.destroyed.push(field_id);
                }
                Err(e) => {
                    error!("Failed to destroy editor instance for field '{field_id}': {e}");
                    results.failed.insert(field_id, e);
                }
            }
        }

        info!(
            "Destroyed {} instance(s), {} failed",
            results.destroyed.len(),
            results.failed.len()
        );
        results
    }

    /// Identity of the live instance bound to a field, if any.
    pub async fn instance(&self, field_id: &str) -> Option<InstanceInfo> {
        let instances = self.instances.lock().await;
        instances.get(field_id).map(|instance| InstanceInfo {
            field_id: field_id.to_string(),
            instance_id: instance.id,
        })
    }

    /// Field ids of all live instances.
    pub async fn instance_ids(&self) -> Vec<String> {
        let instances = self.instances.lock().await;
        instances.keys().cloned().collect()
    }

    /// Whether a live instance is bound to the field.
    pub async fn is_enabled(&self, field_id: &str) -> bool {
        self.instances.lock().await.contains_key(field_id)
    }

    async fn handle(&self, field_id: &str) -> Result<Arc<dyn EditorHandle>, SessionError> {
        let instances = self.instances.lock().await;
        instances
            .get(field_id)
            .map(|instance| Arc::clone(&instance.handle))
            .ok_or_else(|| SessionError::NotFound(field_id.to_string()))
    }

    /// Focus the editor bound to the field, falling back to the plain field
    /// when no instance is live.
    pub async fn focus(&self, field: &dyn FormField) {
        match self.handle(field.id()).await {
            Ok(handle) => handle.focus().await,
            Err(_) => field.focus(),
        }
    }

    /// Place the text cursor inside the instance document.
    pub async fn set_cursor_position(
        &self,
        field_id: &str,
        node: Option<NodeId>,
        position: CursorPosition,
    ) -> Result<(), SessionError> {
        let handle = self.handle(field_id).await?;
        handle.set_selection(node, position).await?;
        Ok(())
    }

    /// Push the serialized editor content into the bound field.
    ///
    /// Content that is only whitespace and empty markup, without an image,
    /// clears the field instead so placeholder handling keeps working.
    pub async fn update_linked_field(&self, field_id: &str) -> Result<(), SessionError> {
        let (field, handle) = {
            let instances = self.instances.lock().await;
            match instances.get(field_id) {
                Some(instance) => (Arc::clone(&instance.field), Arc::clone(&instance.handle)),
                None => return Err(SessionError::NotFound(field_id.to_string())),
            }
        };

        let data = handle.data().await;
        if is_effectively_empty(&data) {
            field.set_value("");
        } else {
            field.set_value(&data);
        }
        Ok(())
    }

    /// Start a resize drag on the instance's editable area.
    ///
    /// Captures the pointer position and current height; while the editing
    /// area is focused, the engine badge affordance is suppressed for the
    /// duration of the drag.
    pub async fn begin_resize(&self, field_id: &str, pointer_y: f64) -> Result<(), SessionError> {
        let mut instances = self.instances.lock().await;
        let instance = instances
            .get_mut(field_id)
            .ok_or_else(|| SessionError::NotFound(field_id.to_string()))?;

        let start_height = instance.handle.editable_height().await;
        let mut session = ResizeSession::begin(pointer_y, start_height);

        if instance.handle.is_focused().await {
            instance.handle.set_badge_visible(false).await;
            session.affordance_hidden = true;
        }

        instance.resize = Some(session);
        Ok(())
    }

    /// Apply the clamped height for the current pointer position.
    ///
    /// Returns `Ok(None)` when no drag is in progress for the field.
    pub async fn resize_to(&self, field_id: &str, pointer_y: f64) -> Result<Option<f64>, SessionError> {
        let mut instances = self.instances.lock().await;
        let instance = instances
            .get_mut(field_id)
            .ok_or_else(|| SessionError::NotFound(field_id.to_string()))?;

        let Some(session) = instance.resize.as_mut() else {
            return Ok(None);
        };

        let height = session.drag_to(pointer_y);
        instance.handle.set_editable_style("height", &format!("{height}px")).await?;
        Ok(Some(height))
    }

    /// End the resize drag, re-applying the final height with its offset
    /// and restoring the suppressed affordance.
    ///
    /// Returns `Ok(None)` when no drag is in progress for the field.
    pub async fn end_resize(&self, field_id: &str) -> Result<Option<f64>, SessionError> {
        let mut instances = self.instances.lock().await;
        let instance = instances
            .get_mut(field_id)
            .ok_or_else(|| SessionError::NotFound(field_id.to_string()))?;

        let Some(session) = instance.resize.take() else {
            return Ok(None);
        };

        if session.affordance_hidden {
            instance.handle.set_badge_visible(true).await;
        }

        let final_height = session.release();
        instance
            .handle
            .set_editable_style("height", &format!("{final_height}px"))
            .await?;
        Ok(Some(final_height))
    }

    /// Look up and render mention candidates for an entity kind.
    pub async fn mention_candidates(
        &self,
        kind: MentionKind,
        search_term: &str,
    ) -> Result<Vec<CompletionCandidate>, ProviderError> {
        let Some(group) = providers::mention_group(&self.config.mentions, kind) else {
            return Ok(Vec::new());
        };

        let records = self.completion.mention_candidates(kind, search_term).await?;
        Ok(providers::render_candidates(&group, records))
    }

    /// Look up and render autocompletion candidates for a trigger marker.
    ///
    /// Unknown markers and search terms below the configured minimum length
    /// yield an empty list without a lookup.
    pub async fn completion_candidates(
        &self,
        marker: &str,
        search_term: &str,
        context: &CompletionContext,
    ) -> Result<Vec<CompletionCandidate>, ProviderError> {
        let group = {
            let groups = self.groups.lock().await;
            groups
                .iter()
                .find(|group| group.mention.is_none() && group.marker == marker)
                .cloned()
        };
        let Some(group) = group else {
            return Ok(Vec::new());
        };

        if search_term.chars().count() < group.min_search_length {
            return Ok(Vec::new());
        }

        let records = self.completion.completion_candidates(marker, search_term, context).await?;
        Ok(providers::render_candidates(&group, records))
    }
}
