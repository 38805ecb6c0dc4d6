use thiserror::Error;

/// Failures inside the filter synchronizer. All of them are recovered
/// locally; none reaches a view.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("persistent storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("storage access failed for key '{key}': {reason}")]
    StorageAccess { key: String, reason: String },

    #[error("malformed persisted snapshot: {0}")]
    MalformedSnapshot(#[source] serde_json::Error),

    #[error("malformed cross-tab payload: {0}")]
    MalformedCrossTabPayload(#[source] serde_json::Error),

    #[error("failed to serialize filter state: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("'{event}' event handling failed: {reason}")]
    Event { event: String, reason: String },
}

/// Renders a JS exception for log output.
pub(crate) fn js_reason(value: &wasm_bindgen::JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
