//! Section card views for the export configuration editor.
//!
//! The editor screen shows one card per section of the active export
//! type, each holding its field rows in display order. Structural
//! changes rebuild the whole screen from the model; key edits refresh
//! only the affected row preview.

use cursive::{
    Cursive, View,
    theme::{BaseColor, Color},
    utils::markup::StyledString,
    view::{Nameable, Resizable},
    views::{Button, DummyView, EditView, LinearLayout, Panel, ScrollView, TextView},
};

use crate::{
    data::{
        app_data::{EditorData, SectionRows},
        field::FieldRow,
        types::Section,
    },
    ui::components::editors,
};

/// Build the full editor screen from the model.
pub fn editor_view(data: &EditorData) -> impl View + use<> {
    let header = LinearLayout::horizontal()
        .child(TextView::new(format!(
            "Export Type: {}",
            data.export_type.label()
        )))
        .child(DummyView.fixed_width(2))
        .child(Button::new("Change Type", editors::show_export_type_select));

    let mut cards = LinearLayout::vertical();
    for card in &data.sections {
        cards.add_child(section_card(card));
    }

    LinearLayout::vertical()
        .child(header)
        .child(ScrollView::new(cards).full_height())
        .child(TextView::new(
            "q: quit  s: save and exit  t: export type  Esc: back",
        ))
}

/// Rebuild the editor screen layer from the current model.
pub fn refresh(siv: &mut Cursive) {
    let Some(data) = siv.user_data::<EditorData>().cloned() else {
        return;
    };
    siv.pop_layer();
    siv.add_fullscreen_layer(editor_view(&data));
}

/// Refresh one row's preview line from the current model.
pub fn refresh_preview(siv: &mut Cursive, section: Section, row: usize) {
    let Some(text) = siv.user_data::<EditorData>().and_then(|data| {
        data.section_rows(section)
            .and_then(|card| card.rows.get(row))
            .map(preview_text)
    }) else {
        return;
    };
    siv.call_on_name(&preview_name(section, row), |view: &mut TextView| {
        view.set_content(text);
    });
}

fn section_card(card: &SectionRows) -> impl View + use<> {
    let section = card.section;

    let mut body = LinearLayout::vertical();
    if card.rows.is_empty() {
        body.add_child(TextView::new(StyledString::styled(
            "(no fields)",
            Color::Light(BaseColor::Black),
        )));
    }
    for (idx, row) in card.rows.iter().enumerate() {
        body.add_child(field_row_view(section, idx, row));
    }

    body.add_child(
        LinearLayout::horizontal()
            .child(Button::new("Add Field", move |siv| {
                if let Some(data) = siv.user_data::<EditorData>() {
                    data.add_field(section);
                }
                refresh(siv);
            }))
            .child(DummyView.fixed_width(2))
            .child(Button::new("Reset Section", move |siv| {
                let message = format!(
                    "Are you sure you want to reset all fields in the \"{}\" section?",
                    section.title()
                );
                editors::show_confirm_danger(siv, &message, move |s| {
                    if let Some(data) = s.user_data::<EditorData>() {
                        data.reset_section(section);
                    }
                    refresh(s);
                });
            })),
    );

    Panel::new(body)
        .title(format!("{} Section", section.title()))
        .with_name(format!("{}-fields", section.key()))
}

fn field_row_view(section: Section, idx: usize, row: &FieldRow) -> impl View + use<> {
    let key_input = EditView::new()
        .content(row.key.clone())
        .on_edit(move |siv, text, _cursor| {
            if let Some(data) = siv.user_data::<EditorData>() {
                data.set_field_key(section, idx, text);
            }
            refresh_preview(siv, section, idx);
        })
        .with_name(key_name(section, idx))
        .fixed_width(24);

    LinearLayout::horizontal()
        .child(key_input)
        .child(DummyView.fixed_width(1))
        .child(Button::new("Edit Source", move |siv| {
            editors::show_source_editor(siv, section, idx);
        }))
        .child(DummyView.fixed_width(1))
        .child(Button::new("X", move |siv| {
            if let Some(data) = siv.user_data::<EditorData>() {
                data.remove_field(section, idx);
            }
            refresh(siv);
        }))
        .child(DummyView.fixed_width(1))
        .child(TextView::new(preview_text(row)).with_name(preview_name(section, idx)))
}

pub(crate) fn preview_text(row: &FieldRow) -> StyledString {
    let text = row.preview();
    if row.is_valid() {
        StyledString::plain(text)
    } else {
        let text = if text.is_empty() {
            "(incomplete)".to_string()
        } else {
            text
        };
        StyledString::styled(text, Color::Dark(BaseColor::Red))
    }
}

fn key_name(section: Section, row: usize) -> String {
    format!("{}-row-{row}-key", section.key())
}

fn preview_name(section: Section, row: usize) -> String {
    format!("{}-row-{row}-preview", section.key())
}
