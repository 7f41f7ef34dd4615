//! Richtext Session - editor instance lifecycle for form fields
//!
//! This library creates, configures, tracks and destroys rich-text-editor
//! instances bound to form fields, bridges editor-internal events (content
//! change, focus change, image insert) back into the surrounding
//! form/validation layer, and supplies mention/autocomplete data through
//! remote lookups. The editing engine itself (text model, rendering,
//! undo/redo) is an external collaborator reached through the
//! [`engine::EditorEngine`] trait.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`session`] - Session manager and instance registry
//! * [`config`] - Settings and per-instance editor configuration assembly
//! * [`engine`] - Editor engine abstraction layer
//! * [`providers`] - Remote mention/autocompletion data providers
//! * [`field`] - Form-field contract
//! * [`events`] - Session notifications

/// Bridges engine events of live instances into their bound fields
pub mod bridge;

/// Configuration module for settings and editor config assembly
pub mod config;

/// Application constants and default values
pub mod constants;

/// Editor engine abstraction layer
pub mod engine;

/// Session notifications published over a broadcast channel
pub mod events;

/// Form-field contract between the session and the surrounding form
pub mod field;

/// Logging utilities
pub mod logger;

/// Remote mention/autocompletion data providers
pub mod providers;

/// Resize drag sessions for the editable area
pub mod resize;

/// Editor session manager and instance registry
pub mod session;

// Re-export the core types for convenient access
pub use session::{DestroyResults, InstanceInfo, SessionError, SessionManager};
