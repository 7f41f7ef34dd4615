//! Configuration management for richtext-session
//!
//! This module handles loading, parsing, and validation of configuration
//! files, and assembles the per-instance [`EditorConfig`] handed to the
//! engine.

use crate::constants::{COMPLETION_DROPDOWN_LIMIT, DEFAULT_FONT_SIZES, DEFAULT_PICTURE_UPLOAD_ACTION};
use crate::providers::CompletionGroup;
use anyhow::{Context, Result};
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub editor: EditorSettings,
    pub upload: UploadConfig,
    pub mentions: MentionsConfig,
    pub logging: LoggingConfig,
}

/// Editor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Editor UI and content language
    pub user_language: String,
    /// Plugin list replacing the built-in baseline when non-empty
    pub build_plugins: Vec<String>,
    /// Plugins loaded in addition to the plugin list
    pub extra_plugins: Vec<String>,
    /// Plugins removed from the plugin list
    pub excluded_plugins: Vec<String>,
    /// Toolbar used when image upload is available
    pub toolbar: Vec<String>,
    /// Toolbar used when no upload form is discoverable near the field
    pub toolbar_without_image: Vec<String>,
    /// Heading option fragments, each the body of a JSON object without
    /// the surrounding braces
    pub format_tags: Vec<String>,
    /// Font family names offered in the toolbar
    pub font_names: Vec<String>,
    /// Font sizes offered in the toolbar
    pub font_sizes: Vec<String>,
    /// Fixed editable-area width (CSS length), if any
    pub width: Option<String>,
    /// Fixed editable-area height (CSS length), if any
    pub height: Option<String>,
    /// Minimum editable-area height (CSS length), if any
    pub min_height: Option<String>,
    /// Markup rules allowed in content, replacing the built-in defaults
    /// when non-empty
    pub content_allowed: Vec<ContentRule>,
    /// Markup rules stripped from content
    pub content_disallowed: Vec<ContentRule>,
}

/// Upload endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Base URL all endpoint actions are appended to
    pub base_link: String,
    /// Action name of the picture upload endpoint
    pub picture_upload_action: String,
    /// Name of the session parameter appended to upload URLs
    pub session_name: String,
    /// Value of the session parameter appended to upload URLs
    pub session_id: String,
    /// Image file extensions accepted by the upload endpoint
    pub image_types: Vec<String>,
}

/// Mention trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionsConfig {
    /// Trigger marker activating group mentions; empty disables them
    pub group_trigger: String,
    /// Trigger marker activating user mentions; empty disables them
    pub user_trigger: String,
    pub group_templates: MentionTemplates,
    pub user_templates: MentionTemplates,
}

/// Output/item templates for one mention entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionTemplates {
    /// Template for the content inserted when a mention is picked
    pub output_template: String,
    /// Template for the dropdown item label
    pub item_template: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn or error
    pub level: String,
    /// Optional log file; stderr only when unset
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: None,
        }
    }
}

/// One allowed/disallowed markup rule.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ContentRule {
    /// Element name, or `*` for any element
    pub name: String,
    /// Attribute names admitted on the element; `*` admits all
    pub attributes: Vec<String>,
    /// Attribute values the element must carry for the rule to apply
    pub attribute_values: HashMap<String, String>,
    /// Whether inline styles are admitted
    pub styles: bool,
    /// Whether classes are admitted
    pub classes: bool,
}

/// One entry of the heading dropdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadingOption {
    /// Model element name (e.g. `heading1`)
    pub model: String,
    /// View element name (e.g. `h1`); absent for paragraph-like entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// Human-readable dropdown title
    pub title: String,
    /// CSS class applied to the dropdown entry
    #[serde(default)]
    pub class: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            user_language: "en".to_string(),
            build_plugins: Vec::new(),
            extra_plugins: Vec::new(),
            excluded_plugins: Vec::new(),
            toolbar: default_toolbar(),
            toolbar_without_image: default_toolbar_without_image(),
            format_tags: Vec::new(),
            font_names: Vec::new(),
            font_sizes: DEFAULT_FONT_SIZES.iter().map(ToString::to_string).collect(),
            width: None,
            height: None,
            min_height: None,
            content_allowed: Vec::new(),
            content_disallowed: Vec::new(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            base_link: String::new(),
            picture_upload_action: DEFAULT_PICTURE_UPLOAD_ACTION.to_string(),
            session_name: "SessionID".to_string(),
            session_id: String::new(),
            image_types: ["png", "gif", "jpg", "jpeg", "bmp"].iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self {
            group_trigger: "@@".to_string(),
            user_trigger: "@".to_string(),
            group_templates: MentionTemplates {
                output_template: "{trigger}{name}".to_string(),
                item_template: "{name}".to_string(),
            },
            user_templates: MentionTemplates {
                output_template: "{trigger}{username}".to_string(),
                item_template: "{fullname} ({username})".to_string(),
            },
        }
    }
}

impl Default for MentionTemplates {
    fn default() -> Self {
        Self {
            output_template: "{trigger}{name}".to_string(),
            item_template: "{name}".to_string(),
        }
    }
}

impl UploadConfig {
    /// Build the picture upload URL for one upload form.
    pub fn upload_url(&self, form_id: &str) -> String {
        format!(
            "{}Action={}&FormID={}&{}={}",
            self.base_link, self.picture_upload_action, form_id, self.session_name, self.session_id
        )
    }
}

/// Baseline plugin superset, used only when no override is configured.
pub(crate) const BASELINE_PLUGINS: &[&str] = &[
    "Alignment",
    "Autocomplete",
    "Autoformat",
    "AutoImage",
    "Base64UploadAdapter",
    "BlockQuote",
    "Bold",
    "Italic",
    "Underline",
    "Strikethrough",
    "Code",
    "Subscript",
    "Superscript",
    "CodeBlock",
    "Essentials",
    "FindAndReplace",
    "FontBackgroundColor",
    "FontColor",
    "FontFamily",
    "FontSize",
    "Fullscreen",
    "GeneralHtmlSupport",
    "Heading",
    "HorizontalLine",
    "HtmlEmbed",
    "Image",
    "ImageBlock",
    "ImageCaption",
    "ImageResize",
    "ImageStyle",
    "ImageToolbar",
    "ImageInline",
    "ImageInsert",
    "Indent",
    "IndentBlock",
    "Link",
    "List",
    "ListProperties",
    "MediaEmbed",
    "PageBreak",
    "PasteFromOffice",
    "PictureEditing",
    "RemoveFormat",
    "SelectAll",
    "ShowBlocks",
    "SimpleUploadAdapter",
    "SourceEditing",
    "SpecialCharacters",
    "SpecialCharactersMathematical",
    "Style",
    "Table",
    "TableCaption",
    "TableCellProperties",
    "TableColumnResize",
    "TableProperties",
    "TableToolbar",
    "TextPartLanguage",
    "TextTransformation",
];

fn default_toolbar() -> Vec<String> {
    [
        "undo",
        "redo",
        "|",
        "heading",
        "|",
        "fontFamily",
        "fontSize",
        "fontColor",
        "fontBackgroundColor",
        "|",
        "bold",
        "italic",
        "underline",
        "strikethrough",
        "removeFormat",
        "|",
        "link",
        "insertImage",
        "insertTable",
        "blockQuote",
        "codeBlock",
        "horizontalLine",
        "|",
        "alignment",
        "bulletedList",
        "numberedList",
        "outdent",
        "indent",
        "|",
        "sourceEditing",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

fn default_toolbar_without_image() -> Vec<String> {
    default_toolbar().into_iter().filter(|item| item != "insertImage").collect()
}

/// Markup rules admitted by default, kept for compatibility with content
/// produced by earlier editor generations.
pub(crate) fn default_content_rules() -> Vec<ContentRule> {
    vec![
        ContentRule {
            name: "div".to_string(),
            attributes: vec!["type".to_string()],
            styles: true,
            ..ContentRule::default()
        },
        ContentRule {
            name: "img".to_string(),
            attributes: vec!["*".to_string()],
            ..ContentRule::default()
        },
        ContentRule {
            name: "col".to_string(),
            attributes: vec!["width".to_string()],
            ..ContentRule::default()
        },
        ContentRule {
            name: "style".to_string(),
            attributes: vec!["*".to_string()],
            styles: true,
            ..ContentRule::default()
        },
        ContentRule {
            name: "*".to_string(),
            attributes: vec!["id".to_string()],
            classes: true,
            ..ContentRule::default()
        },
    ]
}

/// Rule admitting quoted replies (`<div type="cite">`), always appended.
fn cite_rule() -> ContentRule {
    ContentRule {
        name: "div".to_string(),
        attribute_values: [("type".to_string(), "cite".to_string())].into_iter().collect(),
        styles: true,
        ..ContentRule::default()
    }
}

/// The fixed default heading set: paragraph, six heading levels and
/// preformatted text.
pub fn default_heading_options() -> Vec<HeadingOption> {
    let heading = |model: &str, view: Option<&str>, title: &str, class: &str| HeadingOption {
        model: model.to_string(),
        view: view.map(ToString::to_string),
        title: title.to_string(),
        class: class.to_string(),
    };

    vec![
        heading("paragraph", None, "Paragraph", "heading-paragraph"),
        heading("heading1", Some("h1"), "Heading 1", "heading-h1"),
        heading("heading2", Some("h2"), "Heading 2", "heading-h2"),
        heading("heading3", Some("h3"), "Heading 3", "heading-h3"),
        heading("heading4", Some("h4"), "Heading 4", "heading-h4"),
        heading("heading5", Some("h5"), "Heading 5", "heading-h5"),
        heading("heading6", Some("h6"), "Heading 6", "heading-h6"),
        heading("pre", Some("pre"), "Preformatted", "heading-pre"),
    ]
}

/// Parse configured heading fragments into heading options.
///
/// Fragments are parsed individually as JSON object bodies. Any fragment
/// that fails to parse discards the entire accumulated list and the fixed
/// default set is used instead; there is no partial accept.
pub fn heading_options(fragments: &[String]) -> Vec<HeadingOption> {
    let mut options = Vec::new();

    for fragment in fragments {
        let wrapped = format!("{{{fragment}}}");
        match serde_json::from_str::<HeadingOption>(&wrapped) {
            Ok(option) => options.push(option),
            Err(e) => {
                error!("Invalid heading option fragment ({e}); default heading configuration will be used instead");
                options.clear();
                break;
            }
        }
    }

    if options.is_empty() {
        default_heading_options()
    } else {
        options
    }
}

/// Editor UI and content language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    pub ui: String,
    pub content: String,
}

/// Toolbar layout handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarConfig {
    pub items: Vec<String>,
    pub should_not_group_when_full: bool,
}

/// A font option list handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontOptions {
    pub options: Vec<String>,
    pub support_all_values: bool,
}

/// Markup admitted and stripped by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlSupport {
    pub allow: Vec<ContentRule>,
    pub disallow: Vec<ContentRule>,
}

/// Image handling configuration handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    /// File extensions accepted for upload
    pub upload_types: Vec<String>,
    pub resize_unit: String,
    pub insert_type: String,
    pub style_options: Vec<String>,
    pub toolbar: Vec<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            upload_types: UploadConfig::default().image_types,
            resize_unit: "px".to_string(),
            insert_type: "block".to_string(),
            style_options: [
                "inline",
                "alignLeft",
                "alignRight",
                "alignCenter",
                "alignBlockLeft",
                "alignBlockRight",
                "block",
                "side",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            toolbar: [
                "imageStyle:inline",
                "|",
                "imageStyle:alignLeft",
                "imageStyle:alignCenter",
                "imageStyle:alignRight",
                "|",
                "imageStyle:alignBlockLeft",
                "imageStyle:block",
                "imageStyle:alignBlockRight",
                "|",
                "imageStyle:side",
                "|",
                "imageTextAlternative",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
        }
    }
}

/// Upload adapter configuration, present only when an upload form is
/// discoverable near the target field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleUploadConfig {
    pub upload_url: String,
    pub with_credentials: bool,
    pub headers: HashMap<String, String>,
}

/// Completion configuration handed to the engine.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub groups: Vec<CompletionGroup>,
    pub dropdown_limit: usize,
    pub combine_groups_with_same_marker: bool,
}

/// Fully assembled configuration for one editor instance.
///
/// Assembled by [`EditorConfig::build`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub field_id: String,
    pub initial_data: String,
    pub language: LanguageConfig,
    pub plugins: Vec<String>,
    pub extra_plugins: Vec<String>,
    pub removed_plugins: Vec<String>,
    pub toolbar: ToolbarConfig,
    pub heading_options: Vec<HeadingOption>,
    pub font_sizes: FontOptions,
    pub font_families: FontOptions,
    pub html_support: HtmlSupport,
    pub image: ImageConfig,
    /// `None` selects the toolbar variant without image tools
    pub upload: Option<SimpleUploadConfig>,
    pub completion: CompletionConfig,
    pub width: Option<String>,
    pub height: Option<String>,
    pub min_height: Option<String>,
}

impl EditorConfig {
    /// Assemble the configuration for one editor instance.
    ///
    /// Pure with respect to its inputs: all remote data (the completion
    /// groups) must already be resolved by the caller.
    pub fn build(
        config: &Config,
        field_id: &str,
        initial_data: String,
        upload_form_id: Option<&str>,
        groups: Vec<CompletionGroup>,
    ) -> Self {
        let editor = &config.editor;

        let plugins = if editor.build_plugins.is_empty() {
            BASELINE_PLUGINS.iter().map(ToString::to_string).collect()
        } else {
            editor.build_plugins.clone()
        };

        // Uploading by paste/drag & drop keeps working without an upload
        // form; only the toolbar button and the upload adapter are dropped.
        let (toolbar_items, upload) = match upload_form_id {
            Some(form_id) => (
                editor.toolbar.clone(),
                Some(SimpleUploadConfig {
                    upload_url: config.upload.upload_url(form_id),
                    with_credentials: false,
                    headers: HashMap::new(),
                }),
            ),
            None => (editor.toolbar_without_image.clone(), None),
        };

        let mut allow = if editor.content_allowed.is_empty() {
            default_content_rules()
        } else {
            editor.content_allowed.clone()
        };
        allow.push(cite_rule());

        let font_sizes = if editor.font_sizes.is_empty() {
            DEFAULT_FONT_SIZES.iter().map(ToString::to_string).collect()
        } else {
            editor.font_sizes.clone()
        };

        Self {
            field_id: field_id.to_string(),
            initial_data,
            language: LanguageConfig {
                ui: editor.user_language.clone(),
                content: editor.user_language.clone(),
            },
            plugins,
            extra_plugins: editor.extra_plugins.clone(),
            removed_plugins: editor.excluded_plugins.clone(),
            toolbar: ToolbarConfig {
                items: toolbar_items,
                should_not_group_when_full: true,
            },
            heading_options: heading_options(&editor.format_tags),
            font_sizes: FontOptions {
                options: font_sizes,
                support_all_values: true,
            },
            font_families: FontOptions {
                options: editor.font_names.clone(),
                support_all_values: true,
            },
            html_support: HtmlSupport {
                allow,
                disallow: editor.content_disallowed.clone(),
            },
            image: ImageConfig {
                upload_types: config.upload.image_types.clone(),
                ..ImageConfig::default()
            },
            upload,
            completion: CompletionConfig {
                groups,
                dropdown_limit: COMPLETION_DROPDOWN_LIMIT,
                combine_groups_with_same_marker: false,
            },
            width: editor.width.clone(),
            height: editor.height.clone(),
            min_height: editor.min_height.clone(),
        }
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("richtext.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("richtext-session").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !self.logging.level.is_empty() && !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "logging.level must be one of {}, got '{}'",
                valid_levels.join(", "),
                self.logging.level
            );
        }

        if !self.mentions.group_trigger.is_empty()
            && self.mentions.group_trigger == self.mentions.user_trigger
        {
            anyhow::bail!(
                "mention triggers must differ, both are '{}'",
                self.mentions.group_trigger
            );
        }

        if self.editor.toolbar.is_empty() || self.editor.toolbar_without_image.is_empty() {
            anyhow::bail!("toolbar configurations cannot be empty");
        }

        if self.upload.image_types.is_empty() {
            anyhow::bail!("upload.image_types cannot be empty");
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# Richtext Session Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format("%Y-%m-%d")
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("richtext-session"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
