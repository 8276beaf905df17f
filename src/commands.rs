//! The privileged operation set exposed to the webview.
//!
//! Every operation the frontend can invoke is a command in this module and
//! is registered exactly once in `main`. Settings failures on the write
//! path are logged and swallowed; model download/delete failures resolve
//! in-band as a `CommandOutcome` rather than rejecting the invoke.

use serde::Serialize;
use serde_json::Value;
use tauri::{Emitter, State};
use tokio::sync::mpsc;

use crate::models::{CommandOutcome, ModelDescriptor};
use crate::AppState;

/// Name of the event channel carrying pull progress to the initiating window.
pub const DOWNLOAD_PROGRESS_EVENT: &str = "download-progress";

/// Placeholder until API keys get real storage.
const PLACEHOLDER_API_KEY: &str = "tvly-dev-placeholder-api-key";

#[derive(Serialize)]
pub struct SearchResults {
    pub results: String,
}

#[tauri::command]
pub async fn load_initial_data(
    state: State<'_, AppState>,
) -> Result<Option<crate::settings::SettingsDocument>, String> {
    Ok(state.settings.load().await)
}

#[tauri::command]
pub async fn save_settings(
    state: State<'_, AppState>,
    settings: crate::settings::SettingsDocument,
) -> Result<(), String> {
    if let Err(e) = state.settings.save(&settings).await {
        tracing::error!("Failed to save settings: {}", e);
    }
    Ok(())
}

#[tauri::command]
pub async fn save_prompts(state: State<'_, AppState>, prompts: Value) -> Result<(), String> {
    if let Err(e) = state.settings.merge_prompts(prompts).await {
        tracing::error!("Failed to save prompts: {}", e);
    }
    Ok(())
}

#[tauri::command]
pub async fn clear_history() -> CommandOutcome {
    // History lives entirely in the frontend today.
    CommandOutcome::ok()
}

#[tauri::command]
pub async fn get_models(state: State<'_, AppState>) -> Result<Vec<ModelDescriptor>, String> {
    state.models.list_installed().await.map_err(|e| {
        tracing::error!("Failed to list models: {}", e);
        e.to_string()
    })
}

/// Long-running pull. Output lines are relayed as `download-progress`
/// events to the window that made the call, so two windows pulling
/// different models each see only their own stream.
#[tauri::command]
pub async fn download_model<R: tauri::Runtime>(
    window: tauri::WebviewWindow<R>,
    state: State<'_, AppState>,
    model_name: String,
) -> Result<CommandOutcome, String> {
    tracing::info!("Pulling model {}", model_name);

    let (tx, mut rx) = mpsc::channel::<String>(64);

    let target = tauri::EventTarget::labeled(window.label());
    let emitter = window.clone();
    let forwarder = tauri::async_runtime::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            if let Err(e) = emitter.emit_to(target.clone(), DOWNLOAD_PROGRESS_EVENT, &chunk) {
                tracing::error!("Failed to emit download progress: {}", e);
            }
        }
    });

    let outcome = state.models.pull(&model_name, tx).await;
    // The channel sender is dropped once the pull resolves, which ends the
    // forwarder after the last buffered chunk is delivered.
    let _ = forwarder.await;

    tracing::info!(
        "Pull of {} finished: success={}",
        model_name,
        outcome.success
    );
    Ok(outcome)
}

#[tauri::command]
pub async fn delete_model(
    state: State<'_, AppState>,
    model_name: String,
) -> Result<CommandOutcome, String> {
    tracing::info!("Deleting model {}", model_name);
    Ok(state.models.remove(&model_name).await)
}

#[tauri::command]
pub async fn save_api_key(key: String) -> CommandOutcome {
    // Placeholder: acknowledged but not persisted anywhere yet.
    tracing::info!("API key saved (placeholder, {} chars)", key.len());
    CommandOutcome::ok()
}

#[tauri::command]
pub async fn load_api_key() -> String {
    tracing::info!("API key loaded (placeholder)");
    PLACEHOLDER_API_KEY.to_string()
}

#[tauri::command]
pub async fn search_internet(query: String) -> SearchResults {
    tracing::info!("Searching internet (placeholder): {}", query);
    SearchResults {
        results: format!("Search results for \"{}\"", query),
    }
}
