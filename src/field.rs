//! Form-field contract.
//!
//! The bound field is a plain text-holding element owned by the surrounding
//! form; the session manager reads and writes its value directly and defers
//! validation to it. Host applications implement [`FormField`] over their
//! own form layer; [`TextField`] is a minimal in-memory binding sufficient
//! for headless use and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Contract between the session manager and a bound form field.
pub trait FormField: Send + Sync {
    /// Unique field identifier within the form.
    fn id(&self) -> &str;

    /// Current field value.
    fn value(&self) -> String;

    /// Replace the field value.
    fn set_value(&self, value: &str);

    /// Whether the field is currently flagged erroneous by validation.
    fn has_error(&self) -> bool;

    /// Run the surrounding form validation for this field.
    fn validate(&self);

    /// Remove any pending error tooltip.
    fn clear_error_tooltip(&self);

    /// Upload-session token from the adjacent hidden field, when image
    /// upload is available for this field.
    fn upload_form_id(&self) -> Option<String>;

    /// Give the plain field input focus (fallback when no instance is live).
    fn focus(&self);
}

/// Minimal in-memory implementation of [`FormField`].
///
/// Validation is a plain required-check: a required field with an empty
/// (whitespace-only) value is flagged erroneous.
pub struct TextField {
    id: String,
    value: Mutex<String>,
    required: bool,
    error: AtomicBool,
    tooltip: AtomicBool,
    focused: AtomicBool,
    upload_form_id: Option<String>,
}

impl TextField {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: Mutex::new(String::new()),
            required: false,
            error: AtomicBool::new(false),
            tooltip: AtomicBool::new(false),
            focused: AtomicBool::new(false),
            upload_form_id: None,
        }
    }

    /// Mark the field as required for validation purposes.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Attach an upload-session token, enabling image upload configuration.
    pub fn with_upload_form_id(mut self, token: impl Into<String>) -> Self {
        self.upload_form_id = Some(token.into());
        self
    }

    /// Host-side hook: show an error tooltip for this field.
    pub fn show_error_tooltip(&self) {
        self.tooltip.store(true, Ordering::SeqCst);
    }

    /// Whether an error tooltip is currently pending.
    pub fn has_error_tooltip(&self) -> bool {
        self.tooltip.load(Ordering::SeqCst)
    }

    /// Whether the plain-field focus fallback was used.
    pub fn was_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }
}

impl FormField for TextField {
    fn id(&self) -> &str {
        &self.id
    }

    fn value(&self) -> String {
        self.value.lock().map(|value| value.clone()).unwrap_or_default()
    }

    fn set_value(&self, value: &str) {
        if let Ok(mut current) = self.value.lock() {
            *current = value.to_string();
        }
    }

    fn has_error(&self) -> bool {
        self.error.load(Ordering::SeqCst)
    }

    fn validate(&self) {
        let empty = self.value().trim().is_empty();
        self.error.store(self.required && empty, Ordering::SeqCst);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_field_flags_empty_value() {
        let field = TextField::new("Body").required(true);
        field.validate();
        assert!(field.has_error());

        field.set_value("<p>text</p>");
        field.validate();
        assert!(!field.has_error());
    }

    #[test]
    fn test_optional_field_never_errors() {
        let field = TextField::new("Body");
        field.validate();
        assert!(!field.has_error());
    }

    #[test]
    fn test_tooltip_roundtrip() {
        let field = TextField::new("Body");
        field.show_error_tooltip();
        assert!(field.has_error_tooltip());
        field.clear_error_tooltip();
        assert!(!field.has_error_tooltip());
    }

    #[test]
    fn test_upload_form_id_passthrough() {
        let field = TextField::new("Body").with_upload_form_id("form-1");
        assert_eq!(field.upload_form_id().as_deref(), Some("form-1"));
        assert!(TextField::new("Body").upload_form_id().is_none());
    }
}
