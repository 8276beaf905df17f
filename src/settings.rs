use anyhow::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// The settings document is a free-form JSON object; top-level keys are
/// owned by the frontend, except `prompts` which `merge_prompts` manages.
pub type SettingsDocument = Map<String, Value>;

/// Flat JSON settings file at a per-user config path.
///
/// Every operation touches disk; there is no in-memory copy. Writes are a
/// plain overwrite, and concurrent read-modify-write can race. The host is
/// a single-window desktop app so neither is guarded.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `None` when the file is absent or does not parse. A corrupt
    /// file is logged and treated the same as a missing one.
    pub async fn load(&self) -> Option<SettingsDocument> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Settings file not readable at {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!("Settings file at {:?} is not valid JSON: {}", self.path, e);
                None
            }
        }
    }

    /// Overwrites the whole document, pretty-printed. Not atomic.
    pub async fn save(&self, document: &SettingsDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Sets the `prompts` key on the current document (treating an
    /// unreadable document as empty) and writes it back.
    pub async fn merge_prompts(&self, prompts: Value) -> Result<()> {
        let mut document = self.load().await.unwrap_or_default();
        document.insert("prompts".to_string(), prompts);
        self.save(&document).await
    }
}
