use std::path::Path;

use anyhow::Context;
pub use cursive;
use cursive::{Cursive, CursiveExt, event::Key};
use serde_json::Value;

use crate::{
    data::{app_data::EditorData, catalog::Catalogs, types::ExportType},
    ui::{
        components::{editors, menu::editor_view},
        handle_back, handle_quit, handle_save,
    },
};

/// Run the export configuration editor workflow.
///
/// When `always_use_ui` is false and the config file can be parsed,
/// the parsed tree is returned without launching the UI.
///
/// # Errors
///
/// Returns errors when the file extension is unsupported or I/O fails.
pub async fn run(
    config_path: impl AsRef<Path>,
    export_type: ExportType,
    catalogs: Catalogs,
    always_use_ui: bool,
) -> anyhow::Result<Option<Value>> {
    let config_path = config_path.as_ref();

    let content = tokio::fs::read_to_string(&config_path)
        .await
        .unwrap_or_default();

    let ext = config_path
        .extension()
        .map(|s| format!("{}", s.display()))
        .unwrap_or(String::new());

    if let Ok(value) = to_tree(&content, &ext)
        && !always_use_ui
    {
        return Ok(Some(value));
    }

    let mut app = get_content_by_ui(config_path, &content, export_type, catalogs)?;
    if !app.needs_save {
        return Ok(None);
    }
    let val = app.as_json();
    app.on_exit()
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    Ok(Some(val))
}

fn to_tree(s: &str, ext: &str) -> anyhow::Result<Value> {
    if s.trim().is_empty() {
        anyhow::bail!("empty config");
    }
    let value = match ext {
        "json" => serde_json::from_str(s)?,
        "toml" => {
            let v: toml::Value = toml::from_str(s)?;
            serde_json::to_value(v)?
        }
        _ => {
            anyhow::bail!("unsupported config file extension: {ext}");
        }
    };
    Ok(value)
}

fn get_content_by_ui(
    config: impl AsRef<Path>,
    content: &str,
    export_type: ExportType,
    catalogs: Catalogs,
) -> anyhow::Result<EditorData> {
    let app_data = EditorData::new_with_init(content, config.as_ref(), export_type, catalogs)?;

    #[cfg(feature = "logging")]
    {
        cursive::logger::init();
        cursive::logger::set_filter_levels_from_env();
    }
    // 创建Cursive应用
    let mut siv = Cursive::default();

    let view = editor_view(&app_data);

    // 设置EditorData为user_data
    siv.set_user_data(app_data);

    // 添加全局键盘事件处理
    siv.add_global_callback('q', handle_quit);
    siv.add_global_callback('Q', handle_quit);
    siv.add_global_callback('s', handle_save);
    siv.add_global_callback('S', handle_save);
    siv.add_global_callback('t', editors::show_export_type_select);
    siv.add_global_callback('T', editors::show_export_type_select);
    siv.add_global_callback(Key::Esc, handle_back);
    siv.add_global_callback('~', cursive::Cursive::toggle_debug_console);
    siv.add_fullscreen_layer(view);

    // 运行应用
    siv.run();

    let app = siv.take_user_data::<EditorData>().unwrap();
    Ok(app)
}
