//! Remote mention/autocompletion data providers.
//!
//! This module defines the collaborator interface for the two remote
//! lookups (mention candidates, autocompletion settings/candidates) and the
//! completion-group model assembled from them. Groups are built once per
//! editor initialization and are read-only afterwards; raw records coming
//! back from lookups are rendered into display/insertion pairs through
//! `{placeholder}` templates.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::MentionsConfig;

/// Common error types for provider lookups.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// A single record returned by a remote lookup, keyed by record field name.
pub type CandidateRecord = HashMap<String, String>;

/// Mention entity kinds known to the mention endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    Group,
    User,
}

impl MentionKind {
    /// Remote subaction used to look up candidates of this kind.
    pub fn subaction(self) -> &'static str {
        match self {
            MentionKind::Group => "GetGroups",
            MentionKind::User => "GetUsers",
        }
    }

    /// Entity name used in templates and inserted-element attributes.
    pub fn entity_name(self) -> &'static str {
        match self {
            MentionKind::Group => "Groups",
            MentionKind::User => "Users",
        }
    }
}

/// Trigger configuration returned by the autocompletion settings lookup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AutocompletionSettings {
    /// Minimum search-term length before candidates are looked up.
    pub min_search_length: usize,
    /// Template for the content inserted when a candidate is picked.
    pub output_template: String,
    /// Template for the dropdown item label.
    pub item_template: String,
    /// Trigger marker -> trigger-specific settings (opaque to this module).
    pub triggers: HashMap<String, serde_json::Value>,
}

/// Contextual form values forwarded with autocompletion lookups.
///
/// These are read fresh for every lookup because the user may have changed
/// them in the form since the editor was constructed.
#[derive(Debug, Clone, Default)]
pub struct CompletionContext {
    pub ticket_id: Option<String>,
    pub action: Option<String>,
    pub queue_id: Option<String>,
}

/// Remote endpoints supplying mention and autocompletion data.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Look up mention candidates for one entity kind.
    async fn mention_candidates(
        &self,
        kind: MentionKind,
        search_term: &str,
    ) -> Result<Vec<CandidateRecord>, ProviderError>;

    /// Fetch the autocompletion trigger configuration.
    async fn autocompletion_settings(&self) -> Result<AutocompletionSettings, ProviderError>;

    /// Look up autocompletion candidates for one trigger marker.
    async fn completion_candidates(
        &self,
        trigger: &str,
        search_term: &str,
        context: &CompletionContext,
    ) -> Result<Vec<CandidateRecord>, ProviderError>;
}

/// How a completion group matches typed text against candidate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    NameStartsWith,
    Everything,
}

/// Attribute template attached to inserted completion elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeTemplate {
    pub name: String,
    pub value: String,
    /// When set, `{key}` placeholders in `value` are substituted per record.
    pub replace_placeholders: bool,
}

impl AttributeTemplate {
    fn fixed(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            replace_placeholders: false,
        }
    }

    fn templated(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            replace_placeholders: true,
        }
    }
}

/// One trigger-marker -> data-source binding. Read-only after construction.
#[derive(Debug, Clone)]
pub struct CompletionGroup {
    /// Character sequence activating this group (e.g. `@`).
    pub marker: String,
    pub matching: MatchStrategy,
    pub output_template: String,
    pub item_template: String,
    /// Attributes set on the inserted element.
    pub output_attributes: Vec<AttributeTemplate>,
    /// Attributes set on the dropdown item element.
    pub item_attributes: Vec<AttributeTemplate>,
    /// Present for mention groups; `None` for generic autocompletion.
    pub mention: Option<MentionKind>,
    /// Minimum search length; zero for mention groups.
    pub min_search_length: usize,
    /// Whether picked content is inserted as raw markup.
    pub html_replacement: bool,
}

/// A rendered attribute on a completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedAttribute {
    pub name: String,
    pub value: String,
}

/// A rendered completion candidate: dropdown label plus inserted content.
#[derive(Debug, Clone)]
pub struct CompletionCandidate {
    pub label: String,
    pub content: String,
    pub html_replacement: bool,
    pub attributes: Vec<RenderedAttribute>,
    pub item_attributes: Vec<RenderedAttribute>,
    /// Entity name for mention candidates.
    pub entity: Option<&'static str>,
}

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{(.*?)\}").expect("static pattern"));

/// Replace `{key}` placeholders with record values, leaving unknown keys
/// untouched.
pub fn replace_placeholders(template: &str, values: &CandidateRecord) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |captures: &regex::Captures| {
            let key = &captures[1];
            values.get(key).cloned().unwrap_or_else(|| captures[0].to_string())
        })
        .into_owned()
}

/// Attributes every inserted mention element carries.
///
/// The `href` attribute keeps mention elements convertible into plain text
/// that stays matchable by the notification layer.
fn default_mention_attributes(kind: MentionKind) -> Vec<AttributeTemplate> {
    vec![
        AttributeTemplate::fixed("mention-type", kind.entity_name()),
        AttributeTemplate::fixed("href", "#"),
    ]
}

/// Build the mention completion group for one entity kind, when its trigger
/// is configured.
pub fn mention_group(config: &MentionsConfig, kind: MentionKind) -> Option<CompletionGroup> {
    let (trigger, templates) = match kind {
        MentionKind::Group => (&config.group_trigger, &config.group_templates),
        MentionKind::User => (&config.user_trigger, &config.user_templates),
    };
    if trigger.is_empty() {
        return None;
    }

    let mut output_attributes = default_mention_attributes(kind);
    if kind == MentionKind::User {
        output_attributes.push(AttributeTemplate::templated("id", "{username}"));
    }

    Some(CompletionGroup {
        marker: trigger.clone(),
        matching: MatchStrategy::NameStartsWith,
        output_template: templates.output_template.clone(),
        item_template: templates.item_template.clone(),
        output_attributes,
        item_attributes: vec![AttributeTemplate::templated("data-id", "{id}")],
        mention: Some(kind),
        min_search_length: 0,
        html_replacement: false,
    })
}

/// Build mention completion groups from the configured triggers.
pub fn mention_groups(config: &MentionsConfig) -> Vec<CompletionGroup> {
    [MentionKind::Group, MentionKind::User]
        .into_iter()
        .filter_map(|kind| mention_group(config, kind))
        .collect()
}

/// Build generic autocompletion groups from the remote settings.
pub fn autocompletion_groups(settings: &AutocompletionSettings) -> Vec<CompletionGroup> {
    let mut markers: Vec<&String> = settings.triggers.keys().collect();
    markers.sort();

    markers
        .into_iter()
        .map(|marker| CompletionGroup {
            marker: marker.clone(),
            matching: MatchStrategy::Everything,
            output_template: settings.output_template.clone(),
            item_template: settings.item_template.clone(),
            output_attributes: Vec::new(),
            item_attributes: Vec::new(),
            mention: None,
            min_search_length: settings.min_search_length,
            html_replacement: true,
        })
        .collect()
}

/// Render raw lookup records into candidates using the group's templates.
///
/// The group's trigger marker is injected into each record under the
/// `trigger` key so templates can reference it.
pub fn render_candidates(group: &CompletionGroup, records: Vec<CandidateRecord>) -> Vec<CompletionCandidate> {
    records
        .into_iter()
        .map(|mut values| {
            values.insert("trigger".to_string(), group.marker.clone());

            let render = |template: &AttributeTemplate| RenderedAttribute {
                name: template.name.clone(),
                value: if template.replace_placeholders {
                    replace_placeholders(&template.value, &values)
                } else {
                    template.value.clone()
                },
            };

            CompletionCandidate {
                label: replace_placeholders(&group.item_template, &values),
                content: replace_placeholders(&group.output_template, &values),
                html_replacement: group.html_replacement,
                attributes: group.output_attributes.iter().map(render).collect(),
                item_attributes: group.item_attributes.iter().map(render).collect(),
                entity: group.mention.map(MentionKind::entity_name),
            }
        })
        .collect()
}
