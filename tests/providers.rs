mod utils;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use richtext_session::providers::{AutocompletionSettings, CompletionContext, MatchStrategy, MentionKind};

use utils::{manager_with, record, CountingField, MockEngine, StubCompletionBackend};

fn settings_with_trigger(marker: &str, min_search_length: usize) -> AutocompletionSettings {
    let mut triggers = HashMap::new();
    triggers.insert(marker.to_string(), serde_json::Value::Null);
    AutocompletionSettings {
        min_search_length,
        output_template: "<span>{name}</span>".to_string(),
        item_template: "{name}".to_string(),
        triggers,
    }
}

#[tokio::test]
async fn test_completion_groups_resolved_before_construction() {
    let engine = Arc::new(MockEngine::new());
    let backend = Arc::new(StubCompletionBackend::new().with_settings(settings_with_trigger("::", 2)));
    let manager = manager_with(&engine, &backend);

    manager.create_editor(Arc::new(CountingField::new("Body"))).await.unwrap();

    let config = engine.last_config();
    let groups = &config.completion.groups;
    // one generic trigger plus the two configured mention triggers
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].marker, "::");
    assert_eq!(groups[0].matching, MatchStrategy::Everything);
    assert_eq!(groups[1].marker, "@@");
    assert_eq!(groups[1].mention, Some(MentionKind::Group));
    assert_eq!(groups[2].marker, "@");
    assert_eq!(groups[2].mention, Some(MentionKind::User));
}

#[tokio::test]
async fn test_settings_lookup_failure_keeps_mention_groups() {
    let engine = Arc::new(MockEngine::new());
    let backend = Arc::new(StubCompletionBackend::new());
    backend.fail_settings.store(true, Ordering::SeqCst);
    let manager = manager_with(&engine, &backend);

    // construction succeeds without the autocompletion settings
    manager.create_editor(Arc::new(CountingField::new("Body"))).await.unwrap();

    let config = engine.last_config();
    let groups = &config.completion.groups;
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|group| group.mention.is_some()));
}

#[tokio::test]
async fn test_completion_candidates_gated_by_min_search_length() {
    let engine = Arc::new(MockEngine::new());
    let backend = Arc::new(StubCompletionBackend::new().with_settings(settings_with_trigger("::", 3)));
    *backend.completion_records.lock().unwrap() = vec![record(&[("name", "Incident")])];
    let manager = manager_with(&engine, &backend);

    manager.create_editor(Arc::new(CountingField::new("Body"))).await.unwrap();
    let context = CompletionContext::default();

    // below the threshold no lookup is issued at all
    let candidates = manager.completion_candidates("::", "in", &context).await.unwrap();
    assert!(candidates.is_empty());
    assert_eq!(backend.candidate_lookups.load(Ordering::SeqCst), 0);

    let candidates = manager.completion_candidates("::", "inc", &context).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].label, "Incident");
    assert_eq!(candidates[0].content, "<span>Incident</span>");
    assert!(candidates[0].html_replacement);
    assert_eq!(backend.candidate_lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_completion_candidates_for_unknown_marker_are_empty() {
    let engine = Arc::new(MockEngine::new());
    let backend = Arc::new(StubCompletionBackend::new().with_settings(settings_with_trigger("::", 0)));
    let manager = manager_with(&engine, &backend);

    manager.create_editor(Arc::new(CountingField::new("Body"))).await.unwrap();

    let candidates = manager
        .completion_candidates("##", "term", &CompletionContext::default())
        .await
        .unwrap();
    assert!(candidates.is_empty());
    assert_eq!(backend.candidate_lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_mention_candidates_render_templates_and_attributes() {
    let engine = Arc::new(MockEngine::new());
    let backend = Arc::new(StubCompletionBackend::new());
    *backend.mention_records.lock().unwrap() =
        vec![record(&[("id", "12"), ("username", "jdoe"), ("fullname", "Jane Doe")])];
    let manager = manager_with(&engine, &backend);

    let candidates = manager.mention_candidates(MentionKind::User, "jd").await.unwrap();

    assert_eq!(candidates.len(), 1);
    let candidate = &candidates[0];
    assert_eq!(candidate.label, "Jane Doe (jdoe)");
    assert_eq!(candidate.content, "@jdoe");
    assert!(!candidate.html_replacement);
    assert_eq!(candidate.entity, Some("Users"));

    let attribute = |name: &str| {
        candidate
            .attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.clone())
    };
    assert_eq!(attribute("mention-type"), Some("Users".to_string()));
    assert_eq!(attribute("href"), Some("#".to_string()));
    assert_eq!(attribute("id"), Some("jdoe".to_string()));
    assert_eq!(candidate.item_attributes[0].value, "12");
}
