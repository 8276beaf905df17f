use serde::{Deserialize, Serialize};

/// One installed model, as reported by the CLI's tabular listing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub name: String,
}

/// The `{success, error?}` shape side-effecting operations resolve with.
/// Failures are carried in-band; bridge calls for these never reject.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_outcome_omits_error_field() {
        let value = serde_json::to_value(CommandOutcome::ok()).unwrap();
        assert_eq!(value, json!({"success": true}));
    }

    #[test]
    fn failed_outcome_includes_error_field() {
        let value = serde_json::to_value(CommandOutcome::failed("boom")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "boom"}));
    }
}
