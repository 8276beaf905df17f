use tokio::sync::mpsc;

use super::types::{CommandOutcome, ModelDescriptor};
use crate::process::{self, ProcessError};

/// Drives the external model-management CLI (`ollama` in production; tests
/// substitute a stub program).
pub struct ModelManager {
    cli_program: String,
}

impl ModelManager {
    pub fn new(cli_program: impl Into<String>) -> Self {
        Self {
            cli_program: cli_program.into(),
        }
    }

    /// Lists installed models by parsing the CLI's tabular `list` output.
    /// A CLI failure propagates to the caller as an error.
    pub async fn list_installed(&self) -> Result<Vec<ModelDescriptor>, ProcessError> {
        let stdout = process::run_collect(&self.cli_program, &["list"]).await?;
        Ok(parse_model_list(&stdout))
    }

    /// Pulls a model, forwarding each output chunk through `chunk_tx` as
    /// it arrives. Resolves with an in-band outcome once the CLI exits; a
    /// failed spawn or non-zero exit never becomes a rejected call.
    pub async fn pull(&self, name: &str, chunk_tx: mpsc::Sender<String>) -> CommandOutcome {
        match process::run_streaming(&self.cli_program, &["pull", name], chunk_tx).await {
            Ok(code) => match code {
                Some(0) => CommandOutcome::ok(),
                code => {
                    CommandOutcome::failed(format!("Process exited with code {}", code.unwrap_or(-1)))
                }
            },
            Err(e) => {
                tracing::error!("Failed to pull model {}: {}", name, e);
                CommandOutcome::failed(e.to_string())
            }
        }
    }

    /// Removes a model. Failure resolves to `{success:false, error}` with
    /// the CLI's stderr when it produced any, otherwise the error message.
    pub async fn remove(&self, name: &str) -> CommandOutcome {
        match process::run_collect(&self.cli_program, &["rm", name]).await {
            Ok(stdout) => {
                if !stdout.trim().is_empty() {
                    tracing::debug!("rm {}: {}", name, stdout.trim_end());
                }
                CommandOutcome::ok()
            }
            Err(e) => {
                tracing::error!("Failed to delete model {}: {}", name, e);
                match e.captured_stderr() {
                    Some(stderr) => CommandOutcome::failed(stderr),
                    None => CommandOutcome::failed(e.to_string()),
                }
            }
        }
    }
}

/// Parses the CLI's line-oriented table: a header line followed by one row
/// per model, first whitespace-delimited field is the name. Fewer than two
/// lines means nothing is installed.
fn parse_model_list(stdout: &str) -> Vec<ModelDescriptor> {
    let lines: Vec<&str> = stdout.trim().lines().collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    lines[1..]
        .iter()
        .filter_map(|line| line.split_whitespace().next())
        .map(|name| ModelDescriptor {
            name: name.to_string(),
        })
        .collect()
}
