//! Fixed keys of the key-value area.

/// Opaque JSON object with the personalization screen state.
pub const PERSONALIZATION_SETTINGS_KEY: &str = "personalizationSettings";

/// JSON array of user-saved themes.
pub const SAVED_THEMES_KEY: &str = "savedThemes";

/// Plain text of the quick note widget.
pub const QUICK_NOTE_KEY: &str = "quickNoteContent";
