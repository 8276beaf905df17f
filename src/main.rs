// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod commands;
mod models;
mod process;
mod settings;

use models::ModelManager;
use settings::SettingsStore;
use tauri::webview::PageLoadEvent;

/// Shared handles behind the command bridge. Settings and the model CLI
/// have no interior locks; the accepted concurrency model is "whatever the
/// single webview does", and concurrent pulls each own their subprocess.
pub struct AppState {
    pub settings: SettingsStore,
    pub models: ModelManager,
}

const MAIN_WINDOW: &str = "main";

fn create_main_window(app: &tauri::AppHandle) -> tauri::Result<tauri::WebviewWindow> {
    // Hidden until the page finishes loading, then revealed maximized to
    // avoid flashing an unstyled document.
    tauri::WebviewWindowBuilder::new(
        app,
        MAIN_WINDOW,
        tauri::WebviewUrl::App("index.html".into()),
    )
    .title("Ollamadesk")
    .inner_size(800.0, 600.0)
    .visible(false)
    .build()
}

fn main() {
    tracing_subscriber::fmt::init();

    let project_dirs = directories::ProjectDirs::from("com", "ollamadesk", "Ollamadesk")
        .expect("Failed to resolve project directories");
    let config_dir = project_dirs.config_dir();
    std::fs::create_dir_all(config_dir).expect("Failed to create config directory");

    let settings_path = config_dir.join("settings.json");
    tracing::info!("Settings path: {:?}", settings_path);

    let app_state = AppState {
        settings: SettingsStore::new(settings_path),
        models: ModelManager::new("ollama"),
    };

    let app = tauri::Builder::default()
        .manage(app_state)
        .setup(|app| {
            create_main_window(app.handle())?;
            Ok(())
        })
        .on_page_load(|webview, payload| {
            if matches!(payload.event(), PageLoadEvent::Finished) {
                let window = webview.window();
                let _ = window.maximize();
                let _ = window.show();
                let _ = window.set_focus();
            }
        })
        .invoke_handler(tauri::generate_handler![
            commands::load_initial_data,
            commands::save_settings,
            commands::save_prompts,
            commands::clear_history,
            commands::get_models,
            commands::download_model,
            commands::delete_model,
            commands::save_api_key,
            commands::load_api_key,
            commands::search_internet,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(handle_run_event);
}

/// macOS convention: closing every window keeps the process resident, and
/// re-activation recreates the window.
#[cfg(target_os = "macos")]
fn handle_run_event(app_handle: &tauri::AppHandle, event: tauri::RunEvent) {
    use tauri::Manager;

    match event {
        tauri::RunEvent::ExitRequested { code: None, api, .. } => {
            api.prevent_exit();
        }
        tauri::RunEvent::Reopen { .. } => {
            if app_handle.webview_windows().is_empty() {
                if let Err(e) = create_main_window(app_handle) {
                    tracing::error!("Failed to recreate main window: {}", e);
                }
            }
        }
        _ => {}
    }
}

/// Elsewhere the default lifecycle applies: the process exits when the
/// last window closes.
#[cfg(not(target_os = "macos"))]
fn handle_run_event(_app_handle: &tauri::AppHandle, _event: tauri::RunEvent) {}
