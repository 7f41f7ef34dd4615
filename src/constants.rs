//! Constants used throughout the library
//!
//! This module centralizes magic values and default lists to improve
//! maintainability and consistency.

// Resize interaction bounds
/// Minimum editable-area height during a resize drag, in pixels
pub const RESIZE_MIN_HEIGHT: f64 = 150.0;
/// Maximum editable-area height during a resize drag, in pixels
pub const RESIZE_MAX_HEIGHT: f64 = 900.0;
/// Offset re-applied to the final height when a resize drag is released
pub const RESIZE_RELEASE_OFFSET: f64 = 5.5;

/// Quiet window of the debounced validation pass, in milliseconds
pub const VALIDATION_DEBOUNCE_MS: u64 = 250;

/// Capacity of the session event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Maximum number of entries offered in a completion dropdown
pub const COMPLETION_DROPDOWN_LIMIT: usize = 20;

/// Default action name of the picture upload endpoint
pub const DEFAULT_PICTURE_UPLOAD_ACTION: &str = "PictureUpload";

// Image handling
/// Element name the engine reports for block image insertions
pub const IMAGE_BLOCK_ELEMENT: &str = "imageBlock";
/// Attribute carrying an image's alignment style
pub const IMAGE_STYLE_ATTRIBUTE: &str = "imageStyle";
/// Alignment applied to inserted images that carry no explicit style
pub const DEFAULT_IMAGE_ALIGNMENT: &str = "alignBlockLeft";

/// Class prefix of style blocks previously injected into field content,
/// stripped from the initial value before the engine sees it
pub const INJECTED_STYLE_CLASS_PREFIX: &str = "RichTextContentCss";

/// Default font sizes offered in the toolbar
pub const DEFAULT_FONT_SIZES: &[&str] = &[
    "8px", "10px", "12px", "14px", "16px", "18px", "20px", "22px", "24px", "26px", "28px", "30px",
];
