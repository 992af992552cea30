//! Modal editors and confirmation dialogs.
//!
//! A single source editor dialog is opened per row edit; its control
//! state lives in a shared [`SourceDraft`] and is only merged back into
//! the model when the save validates. Each control owns exactly one
//! callback for its lifetime.

use std::{cell::RefCell, rc::Rc};

use cursive::{
    Cursive, View,
    theme::{BaseColor, Color},
    utils::markup::StyledString,
    view::{Nameable, Resizable},
    views::{
        Dialog, DummyView, EditView, HideableView, LinearLayout, ScrollView, SelectView, TextView,
    },
};

use crate::{
    data::{
        app_data::EditorData,
        catalog::Catalogs,
        source::SourceDraft,
        types::{ExportType, OutputType, Section, SourceType},
    },
    ui::components::menu,
};

/// Ask for confirmation before a destructive action.
pub fn show_confirm_danger<F>(siv: &mut Cursive, message: &str, on_confirm: F)
where
    F: Fn(&mut Cursive) + 'static,
{
    siv.add_layer(
        Dialog::text(message)
            .title("Confirm")
            .button("Confirm", move |s| {
                s.pop_layer();
                on_confirm(s);
            })
            .dismiss_button("Cancel"),
    );
}

/// Select a different export type.
///
/// Switching is destructive when rows exist; the user is asked first and
/// declining leaves everything unchanged.
pub fn show_export_type_select(siv: &mut Cursive) {
    let Some(data) = siv.user_data::<EditorData>() else {
        return;
    };
    let current = data.export_type;

    let mut select = SelectView::<ExportType>::new();
    for ty in ExportType::ALL {
        select.add_item(ty.label(), ty);
    }
    let selected = ExportType::ALL
        .iter()
        .position(|ty| *ty == current)
        .unwrap_or(0);

    let select = select.selected(selected).on_submit(|siv, ty: &ExportType| {
        let ty = *ty;
        siv.pop_layer();
        let Some(data) = siv.user_data::<EditorData>() else {
            return;
        };
        if data.export_type == ty {
            return;
        }
        if data.has_fields() {
            show_confirm_danger(
                siv,
                "You have unsaved field mappings. Changing the export type will clear them. Continue?",
                move |s| apply_export_type(s, ty),
            );
        } else {
            apply_export_type(siv, ty);
        }
    });

    siv.add_layer(
        Dialog::around(select)
            .title("Export Type")
            .dismiss_button("Cancel"),
    );
}

fn apply_export_type(siv: &mut Cursive, ty: ExportType) {
    if let Some(data) = siv.user_data::<EditorData>() {
        data.set_export_type(ty);
    }
    menu::refresh(siv);
}

/// Open the source editor dialog for one field row.
pub fn show_source_editor(siv: &mut Cursive, section: Section, row: usize) {
    let Some(data) = siv.user_data::<EditorData>() else {
        return;
    };
    let Some((session, draft)) = data.open_editor(section, row) else {
        return;
    };
    let key = data
        .section_rows(section)
        .and_then(|card| card.rows.get(row))
        .map(|field| field.key.trim().to_string())
        .unwrap_or_default();
    let catalogs = Rc::new(data.catalogs.clone());
    let export_type = data.export_type;
    let draft = Rc::new(RefCell::new(draft));

    let allowed: Vec<SourceType> = SourceType::ALL
        .iter()
        .copied()
        .filter(|ty| ty.allowed_in(section))
        .collect();
    {
        // a payload can carry a type the section no longer offers
        let mut d = draft.borrow_mut();
        if !d.source_type.allowed_in(section) {
            d.source_type = allowed[0];
            d.source.clear();
        }
    }

    let mut layout = LinearLayout::vertical();
    if !key.is_empty() {
        layout.add_child(TextView::new(format!("Export Key: \"{key}\"")));
        layout.add_child(DummyView.fixed_height(1));
    }

    let mut type_select = SelectView::<SourceType>::new().popup();
    for ty in &allowed {
        type_select.add_item(ty.label(), *ty);
    }
    let selected = allowed
        .iter()
        .position(|ty| *ty == draft.borrow().source_type)
        .unwrap_or(0);
    let type_select = type_select.selected(selected).on_submit({
        let draft = Rc::clone(&draft);
        let catalogs = Rc::clone(&catalogs);
        move |siv, ty: &SourceType| {
            {
                // the previous selection does not carry across a type switch
                let mut d = draft.borrow_mut();
                d.source_type = *ty;
                d.source.clear();
                d.service.clear();
                d.key.clear();
            }
            let options = source_options_view(&catalogs, export_type, section, &draft);
            siv.call_on_name("source-options-field", |slot: &mut LinearLayout| {
                replace_children(slot, options);
            });
        }
    });
    layout.add_child(labeled("Source Type", type_select));

    let mut options_slot = LinearLayout::vertical();
    options_slot.add_child(source_options_view(&catalogs, export_type, section, &draft));
    layout.add_child(options_slot.with_name("source-options-field"));

    layout.add_child(labeled(
        "Fallback",
        EditView::new()
            .content(draft.borrow().fallback.clone())
            .on_edit({
                let draft = Rc::clone(&draft);
                move |_siv, text, _cursor| draft.borrow_mut().fallback = text.to_string()
            })
            .with_name("fallback-value")
            .fixed_width(30),
    ));

    let mut output_select = SelectView::<OutputType>::new().popup();
    for ty in OutputType::ALL {
        output_select.add_item(ty.label(), ty);
    }
    let selected = OutputType::ALL
        .iter()
        .position(|ty| *ty == draft.borrow().output_type)
        .unwrap_or(0);
    let output_select = output_select.selected(selected).on_submit({
        let draft = Rc::clone(&draft);
        move |siv, ty: &OutputType| {
            draft.borrow_mut().output_type = *ty;
            set_option_visibility(siv, *ty);
            siv.call_on_name("editor-error", |view: &mut TextView| view.set_content(""));
        }
    });
    layout.add_child(labeled("Output Type", output_select));

    let d = draft.borrow().clone();
    let string_options = LinearLayout::vertical()
        .child(labeled(
            "Format",
            EditView::new()
                .content(d.format.clone())
                .on_edit({
                    let draft = Rc::clone(&draft);
                    move |_siv, text, _cursor| draft.borrow_mut().format = text.to_string()
                })
                .with_name("config-format")
                .fixed_width(30),
        ))
        .child(labeled("Text Case", text_case_select(&d.text_case, &draft)));
    let float_options = labeled(
        "Precision",
        EditView::new()
            .content(d.precision.clone())
            .on_edit({
                let draft = Rc::clone(&draft);
                move |_siv, text, _cursor| draft.borrow_mut().precision = text.to_string()
            })
            .with_name("config-precision")
            .fixed_width(6),
    );
    let integer_options = labeled(
        "NaN Label",
        EditView::new()
            .content(d.nan_label.clone())
            .on_edit({
                let draft = Rc::clone(&draft);
                move |_siv, text, _cursor| draft.borrow_mut().nan_label = text.to_string()
            })
            .with_name("config-int-nan")
            .fixed_width(30),
    );

    layout.add_child(hideable(
        "string-options",
        string_options,
        d.output_type == OutputType::String,
    ));
    layout.add_child(hideable(
        "float-options",
        float_options,
        d.output_type == OutputType::Float,
    ));
    layout.add_child(hideable(
        "integer-options",
        integer_options,
        d.output_type == OutputType::Integer,
    ));

    layout.add_child(DummyView.fixed_height(1));
    layout.add_child(TextView::new("").with_name("editor-error"));

    let dialog = Dialog::around(ScrollView::new(layout).min_width(56))
        .title(format!("Edit {} Source", section.label()))
        .button("Save", {
            let draft = Rc::clone(&draft);
            move |siv| {
                let d = draft.borrow().clone();
                let result = siv
                    .user_data::<EditorData>()
                    .map(|data| data.save_editor(&session, &d));
                match result {
                    Some(Ok(())) => {
                        siv.pop_layer();
                        menu::refresh_preview(siv, session.section, session.row);
                    }
                    Some(Err(err)) => {
                        siv.call_on_name("editor-error", |view: &mut TextView| {
                            view.set_content(StyledString::styled(
                                err.to_string(),
                                Color::Dark(BaseColor::Red),
                            ));
                        });
                    }
                    None => {
                        siv.pop_layer();
                    }
                }
            }
        })
        .dismiss_button("Cancel");

    siv.add_layer(dialog);
}

/// Build the type-specific source selection sub-form.
///
/// Choice controls default to their first entry when the draft has no
/// matching selection, mirroring plain select semantics.
fn source_options_view(
    catalogs: &Rc<Catalogs>,
    export_type: ExportType,
    section: Section,
    draft: &Rc<RefCell<SourceDraft>>,
) -> LinearLayout {
    let mut layout = LinearLayout::vertical();
    let source_type = draft.borrow().source_type;

    match source_type {
        SourceType::DbField => {
            let fields = catalogs.db_fields_for(section);
            if fields.is_empty() {
                layout.add_child(muted("No database fields available."));
                return layout;
            }
            {
                let mut d = draft.borrow_mut();
                if !fields.iter().any(|f| f.name == d.source) {
                    d.source = fields[0].name.clone();
                }
            }
            let selected = fields
                .iter()
                .position(|f| f.name == draft.borrow().source)
                .unwrap_or(0);

            let mut select = SelectView::<String>::new().popup();
            for field in fields {
                select.add_item(field.label.clone(), field.name.clone());
            }
            let samples: Vec<(String, Option<String>)> = fields
                .iter()
                .map(|f| (f.name.clone(), f.sample.clone()))
                .collect();
            let select = select.selected(selected).on_submit({
                let draft = Rc::clone(draft);
                move |siv, name: &str| {
                    draft.borrow_mut().source = name.to_string();
                    let sample = samples
                        .iter()
                        .find(|(n, _)| n == name)
                        .and_then(|(_, s)| s.clone());
                    set_sample(siv, sample_line(sample));
                }
            });
            layout.add_child(select);
            let sample = fields
                .iter()
                .find(|f| f.name == draft.borrow().source)
                .and_then(|f| f.sample.clone());
            layout.add_child(sample_view(sample_line(sample)));
        }
        SourceType::Metadata => {
            let services = catalogs.metadata_for(section);
            if services.is_empty() {
                layout.add_child(muted("No metadata services available."));
                return layout;
            }
            {
                let mut d = draft.borrow_mut();
                if !services.iter().any(|s| s.name == d.service) {
                    d.service = services[0].name.clone();
                }
            }
            let selected = services
                .iter()
                .position(|s| s.name == draft.borrow().service)
                .unwrap_or(0);

            let mut select = SelectView::<String>::new().popup();
            for service in services {
                select.add_item(service.name.clone(), service.name.clone());
            }
            let select = select.selected(selected).on_submit({
                let draft = Rc::clone(draft);
                let catalogs = Rc::clone(catalogs);
                move |siv, name: &str| {
                    {
                        let mut d = draft.borrow_mut();
                        d.service = name.to_string();
                        d.key.clear();
                    }
                    let key_view = metadata_key_view(&catalogs, section, &draft);
                    siv.call_on_name("metadata-key-container", |slot: &mut LinearLayout| {
                        replace_children(slot, key_view);
                    });
                    let line = metadata_sample_line(&catalogs, section, &draft);
                    set_sample(siv, line);
                }
            });
            layout.add_child(select);

            let mut key_slot = LinearLayout::vertical();
            key_slot.add_child(metadata_key_view(catalogs, section, draft));
            layout.add_child(key_slot.with_name("metadata-key-container"));

            layout.add_child(sample_view(metadata_sample_line(catalogs, section, draft)));
        }
        SourceType::Static => {
            layout.add_child(
                EditView::new()
                    .content(draft.borrow().source.clone())
                    .on_edit({
                        let draft = Rc::clone(draft);
                        move |_siv, text, _cursor| draft.borrow_mut().source = text.to_string()
                    })
                    .with_name("static-value")
                    .fixed_width(30),
            );
        }
        SourceType::TextContent => {
            let options = section.text_content_options();
            if options.is_empty() {
                layout.add_child(muted("No text content available for this section."));
                return layout;
            }
            {
                let mut d = draft.borrow_mut();
                if !options.iter().any(|(name, _)| *name == d.source) {
                    d.source = options[0].0.to_string();
                }
            }
            let selected = options
                .iter()
                .position(|(name, _)| *name == draft.borrow().source)
                .unwrap_or(0);

            let mut select = SelectView::<String>::new().popup();
            for (name, label) in options.iter().copied() {
                select.add_item(label, name.to_string());
            }
            let select = select.selected(selected).on_submit({
                let draft = Rc::clone(draft);
                move |_siv, name: &str| draft.borrow_mut().source = name.to_string()
            });
            layout.add_child(select);
        }
        SourceType::Special => {
            let fields = catalogs.special_for(section, export_type);
            if fields.is_empty() {
                layout.add_child(muted("No special fields available."));
                return layout;
            }
            {
                let mut d = draft.borrow_mut();
                if !fields.iter().any(|f| f.name == d.source) {
                    d.source = fields[0].name.clone();
                }
            }
            let selected = fields
                .iter()
                .position(|f| f.name == draft.borrow().source)
                .unwrap_or(0);

            let mut select = SelectView::<String>::new().popup();
            for field in fields {
                select.add_item(field.label.clone(), field.name.clone());
            }
            let select = select.selected(selected).on_submit({
                let draft = Rc::clone(draft);
                move |_siv, name: &str| draft.borrow_mut().source = name.to_string()
            });
            layout.add_child(select);
        }
    }
    layout
}

/// Build the key control of the metadata sub-form.
///
/// A service with known keys gets a choice control, anything else a
/// free-text field.
fn metadata_key_view(
    catalogs: &Rc<Catalogs>,
    section: Section,
    draft: &Rc<RefCell<SourceDraft>>,
) -> LinearLayout {
    let mut layout = LinearLayout::vertical();
    let service_name = draft.borrow().service.clone();

    match catalogs.metadata_service(section, &service_name) {
        Some(service) if !service.keys.is_empty() => {
            {
                let mut d = draft.borrow_mut();
                if !service.keys.iter().any(|k| k.name == d.key) {
                    d.key = service.keys[0].name.clone();
                }
            }
            let selected = service
                .keys
                .iter()
                .position(|k| k.name == draft.borrow().key)
                .unwrap_or(0);

            let mut select = SelectView::<String>::new().popup();
            for key in &service.keys {
                select.add_item(key.label.clone(), key.name.clone());
            }
            let samples: Vec<(String, Option<String>)> = service
                .keys
                .iter()
                .map(|k| (k.name.clone(), k.sample.clone()))
                .collect();
            let select = select.selected(selected).on_submit({
                let draft = Rc::clone(draft);
                move |siv, name: &str| {
                    draft.borrow_mut().key = name.to_string();
                    let sample = samples
                        .iter()
                        .find(|(n, _)| n == name)
                        .and_then(|(_, s)| s.clone());
                    set_sample(siv, sample_line(sample));
                }
            });
            layout.add_child(select);
        }
        _ => {
            layout.add_child(
                EditView::new()
                    .content(draft.borrow().key.clone())
                    .on_edit({
                        let draft = Rc::clone(draft);
                        move |_siv, text, _cursor| draft.borrow_mut().key = text.to_string()
                    })
                    .with_name("metadata-key")
                    .fixed_width(30),
            );
        }
    }
    layout
}

fn metadata_sample_line(
    catalogs: &Rc<Catalogs>,
    section: Section,
    draft: &Rc<RefCell<SourceDraft>>,
) -> StyledString {
    let d = draft.borrow();
    match catalogs.metadata_service(section, &d.service) {
        Some(service) if !service.keys.is_empty() => sample_line(
            service
                .keys
                .iter()
                .find(|k| k.name == d.key)
                .and_then(|k| k.sample.clone()),
        ),
        _ => muted_text("No known keys for this service."),
    }
}

fn sample_line(sample: Option<String>) -> StyledString {
    match sample {
        Some(sample) => muted_text(&format!("Sample: {sample}")),
        None => muted_text("Sample: No sample available"),
    }
}

fn sample_view(line: StyledString) -> impl View + use<> {
    TextView::new(line).with_name("sample-value-display")
}

fn set_sample(siv: &mut Cursive, line: StyledString) {
    siv.call_on_name("sample-value-display", |view: &mut TextView| {
        view.set_content(line);
    });
}

fn text_case_select(current: &str, draft: &Rc<RefCell<SourceDraft>>) -> impl View + use<> {
    const CASES: [(&str, &str); 4] = [
        ("(none)", ""),
        ("Upper", "upper"),
        ("Lower", "lower"),
        ("Title", "title"),
    ];
    let mut select = SelectView::<String>::new().popup();
    for (label, value) in CASES {
        select.add_item(label, value.to_string());
    }
    let selected = CASES
        .iter()
        .position(|(_, value)| *value == current)
        .unwrap_or(0);
    select
        .selected(selected)
        .on_submit({
            let draft = Rc::clone(draft);
            move |_siv, value: &str| draft.borrow_mut().text_case = value.to_string()
        })
        .with_name("config-text-case")
}

fn set_option_visibility(siv: &mut Cursive, output_type: OutputType) {
    for (name, ty) in [
        ("string-options", OutputType::String),
        ("float-options", OutputType::Float),
        ("integer-options", OutputType::Integer),
    ] {
        siv.call_on_name(name, |view: &mut HideableView<LinearLayout>| {
            view.set_visible(ty == output_type);
        });
    }
}

fn hideable<V: View>(name: &str, view: V, visible: bool) -> impl View + use<V> {
    let mut wrap = LinearLayout::vertical();
    wrap.add_child(view);
    let mut hidden = HideableView::new(wrap);
    hidden.set_visible(visible);
    hidden.with_name(name)
}

fn labeled<V: View>(label: &str, view: V) -> impl View + use<V> {
    LinearLayout::horizontal()
        .child(TextView::new(format!("{label}: ")).fixed_width(14))
        .child(view)
}

fn muted(text: &str) -> TextView {
    TextView::new(muted_text(text))
}

fn muted_text(text: &str) -> StyledString {
    StyledString::styled(text, Color::Light(BaseColor::Black))
}

fn replace_children<V: View>(slot: &mut LinearLayout, view: V) {
    while slot.len() > 0 {
        slot.remove_child(0);
    }
    slot.add_child(view);
}
