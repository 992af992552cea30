//! UI components and global key handlers.
//!
//! The editor screen and all dialogs read and mutate the [`EditorData`]
//! stored as Cursive user data; every view is a projection of that model.

/// Section cards and modal editors.
pub mod components;

use cursive::{Cursive, views::Dialog};

use crate::data::app_data::EditorData;

/// Quit the editor, asking for confirmation when changes are pending.
pub fn handle_quit(siv: &mut Cursive) {
    let dirty = siv
        .user_data::<EditorData>()
        .map(|data| data.needs_save)
        .unwrap_or(false);
    if !dirty {
        siv.quit();
        return;
    }
    siv.add_layer(
        Dialog::text("Discard unsaved changes?")
            .title("Quit")
            .button("Discard", |s| {
                if let Some(data) = s.user_data::<EditorData>() {
                    data.needs_save = false;
                }
                s.quit();
            })
            .dismiss_button("Cancel"),
    );
}

/// Accept the current state and leave the editor.
///
/// Pending changes are written by the caller after the UI returns.
pub fn handle_save(siv: &mut Cursive) {
    siv.quit();
}

/// Close the topmost dialog, keeping the editor screen.
pub fn handle_back(siv: &mut Cursive) {
    if siv.screen_mut().len() > 1 {
        siv.pop_layer();
    }
}
