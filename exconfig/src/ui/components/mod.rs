//! UI components for the export configuration editor.

/// Modal editors and confirmation dialogs.
pub mod editors;

/// Section cards and field rows.
pub mod menu;
