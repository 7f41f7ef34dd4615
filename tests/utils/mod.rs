//! Shared fixtures for integration tests: a scripted engine, a counting
//! field and a stubbed completion backend.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{broadcast, Semaphore};

use richtext_session::config::{Config, EditorConfig};
use richtext_session::engine::{
    CursorPosition, EditorEngine, EditorHandle, EngineError, EngineEvent, NodeId,
};
use richtext_session::field::FormField;
use richtext_session::providers::{
    AutocompletionSettings, CandidateRecord, CompletionBackend, CompletionContext, MentionKind, ProviderError,
};
use richtext_session::SessionManager;

/// Scripted engine recording construction requests.
pub struct MockEngine {
    pub create_calls: AtomicUsize,
    pub fail_create: AtomicBool,
    pub last_config: Mutex<Option<EditorConfig>>,
    pub handles: Mutex<HashMap<String, Arc<MockHandle>>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            create_calls: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            last_config: Mutex::new(None),
            handles: Mutex::new(HashMap::new()),
            gate: None,
        }
    }

    /// An engine whose `create` blocks until a permit is added to `gate`.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    /// Handle produced for a field, panicking when none was created.
    pub fn handle(&self, field_id: &str) -> Arc<MockHandle> {
        self.handles
            .lock()
            .unwrap()
            .get(field_id)
            .cloned()
            .unwrap_or_else(|| panic!("no handle created for field '{field_id}'"))
    }

    pub fn last_config(&self) -> EditorConfig {
        self.last_config.lock().unwrap().clone().expect("no editor was created")
    }
}

#[async_trait]
impl EditorEngine for MockEngine {
    async fn create(&self, config: EditorConfig) -> Result<Arc<dyn EditorHandle>, EngineError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| EngineError::Unavailable("gate closed".to_string()))?;
            permit.forget();
        }

        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EngineError::Create("engine rejected configuration".to_string()));
        }

        let handle = Arc::new(MockHandle::new());
        self.handles
            .lock()
            .unwrap()
            .insert(config.field_id.clone(), Arc::clone(&handle));
        *self.last_config.lock().unwrap() = Some(config);
        Ok(handle)
    }
}

/// Scripted editor handle recording every mutation.
pub struct MockHandle {
    pub data: Mutex<String>,
    pub destroyed: AtomicBool,
    pub fail_destroy: AtomicBool,
    pub focused: AtomicBool,
    pub badge_visible: AtomicBool,
    pub height: Mutex<f64>,
    pub attributes: Mutex<Vec<(NodeId, String, String)>>,
    pub styles: Mutex<Vec<(String, String)>>,
    pub selections: Mutex<Vec<(Option<NodeId>, CursorPosition)>>,
    events: broadcast::Sender<EngineEvent>,
}

impl MockHandle {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            data: Mutex::new(String::new()),
            destroyed: AtomicBool::new(false),
            fail_destroy: AtomicBool::new(false),
            focused: AtomicBool::new(false),
            badge_visible: AtomicBool::new(true),
            height: Mutex::new(300.0),
            attributes: Mutex::new(Vec::new()),
            styles: Mutex::new(Vec::new()),
            selections: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn set_data(&self, data: &str) {
        *self.data.lock().unwrap() = data.to_string();
    }

    pub fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    /// Last value applied for a style, if any.
    pub fn style(&self, name: &str) -> Option<String> {
        self.styles
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(style, _)| style == name)
            .map(|(_, value)| value.clone())
    }
}

#[async_trait]
impl EditorHandle for MockHandle {
    async fn data(&self) -> String {
        self.data.lock().unwrap().clone()
    }

    fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    async fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    async fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), EngineError> {
        self.attributes
            .lock()
            .unwrap()
            .push((node, name.to_string(), value.to_string()));
        Ok(())
    }

    async fn set_editable_style(&self, name: &str, value: &str) -> Result<(), EngineError> {
        self.styles.lock().unwrap().push((name.to_string(), value.to_string()));
        Ok(())
    }

    async fn set_selection(&self, node: Option<NodeId>, position: CursorPosition) -> Result<(), EngineError> {
        self.selections.lock().unwrap().push((node, position));
        Ok(())
    }

    async fn editable_height(&self) -> f64 {
        *self.height.lock().unwrap()
    }

    async fn set_badge_visible(&self, visible: bool) {
        self.badge_visible.store(visible, Ordering::SeqCst);
    }

    async fn focus(&self) {
        self.focused.store(true, Ordering::SeqCst);
    }

    async fn destroy(&self) -> Result<(), EngineError> {
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(EngineError::Destroy("engine refused".to_string()));
        }
        self.destroyed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Form field counting validation runs.
pub struct CountingField {
    id: String,
    pub value: Mutex<String>,
    pub error: AtomicBool,
    pub tooltip: AtomicBool,
    pub validations: AtomicUsize,
    pub focused: AtomicBool,
    upload_form_id: Option<String>,
}

impl CountingField {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: Mutex::new(String::new()),
            error: AtomicBool::new(false),
            tooltip: AtomicBool::new(false),
            validations: AtomicUsize::new(0),
            focused: AtomicBool::new(false),
            upload_form_id: None,
        }
    }

    pub fn with_upload_form_id(mut self, token: impl Into<String>) -> Self {
        self.upload_form_id = Some(token.into());
        self
    }

    pub fn with_value(self, value: &str) -> Self {
        *self.value.lock().unwrap() = value.to_string();
        self
    }
}

impl FormField for CountingField {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    fn set_value(&self, value: &str) {
        *self.value.lock().unwrap() = value.to_string();
    }

    fn has_error(&self) -> bool {
        self.error.load(Ordering::SeqCst)
    }

    fn validate(&self) {
        self.validations.fetch_add(1, Ordering::SeqCst);
    }

    fn clear_error_tooltip(&self) {
        self.tooltip.store(false, Ordering::SeqCst);
    }

    fn upload_form_id(&self) -> Option<String> {
        self.upload_form_id.clone()
    }

    fn focus(&self) {
        self.focused.store(true, Ordering::SeqCst);
    }
}

/// Completion backend serving canned settings and records.
pub struct StubCompletionBackend {
    pub settings: Mutex<AutocompletionSettings>,
    pub fail_settings: AtomicBool,
    pub mention_records: Mutex<Vec<CandidateRecord>>,
    pub completion_records: Mutex<Vec<CandidateRecord>>,
    pub candidate_lookups: AtomicUsize,
}

impl StubCompletionBackend {
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(AutocompletionSettings::default()),
            fail_settings: AtomicBool::new(false),
            mention_records: Mutex::new(Vec::new()),
            completion_records: Mutex::new(Vec::new()),
            candidate_lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_settings(self, settings: AutocompletionSettings) -> Self {
        *self.settings.lock().unwrap() = settings;
        self
    }
}

#[async_trait]
impl CompletionBackend for StubCompletionBackend {
    async fn mention_candidates(
        &self,
        _kind: MentionKind,
        _search_term: &str,
    ) -> Result<Vec<CandidateRecord>, ProviderError> {
        self.candidate_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.mention_records.lock().unwrap().clone())
    }

    async fn autocompletion_settings(&self) -> Result<AutocompletionSettings, ProviderError> {
        if self.fail_settings.load(Ordering::SeqCst) {
            return Err(ProviderError::Network("settings endpoint unreachable".to_string()));
        }
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn completion_candidates(
        &self,
        _trigger: &str,
        _search_term: &str,
        _context: &CompletionContext,
    ) -> Result<Vec<CandidateRecord>, ProviderError> {
        self.candidate_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.completion_records.lock().unwrap().clone())
    }
}

/// A manager over fresh mocks with the default configuration.
pub fn manager_with(engine: &Arc<MockEngine>, backend: &Arc<StubCompletionBackend>) -> SessionManager {
    SessionManager::new(
        Config::default(),
        Arc::clone(engine) as Arc<dyn EditorEngine>,
        Arc::clone(backend) as Arc<dyn CompletionBackend>,
    )
}

/// A record from field/value pairs.
pub fn record(pairs: &[(&str, &str)]) -> CandidateRecord {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
