//! Error types for the synchronization layer.

use thiserror::Error;

/// Result type alias for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while decoding or applying channel events.
///
/// None of these reach the user: the synchronizer logs them and drops the
/// offending event.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Unknown event: {name}")]
    UnknownEvent { name: String },

    #[error("Missing field `{field}` in {event} payload")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },

    #[error("Malformed {event} payload: {source}")]
    MalformedPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Create an unknown event error
    pub fn unknown_event(name: impl Into<String>) -> Self {
        Self::UnknownEvent { name: name.into() }
    }

    /// Create a missing field error
    pub fn missing_field(event: &'static str, field: &'static str) -> Self {
        Self::MissingField { event, field }
    }

    /// Create a malformed payload error
    pub fn malformed(event: &'static str, source: serde_json::Error) -> Self {
        Self::MalformedPayload { event, source }
    }

    /// Whether the event was recognised but its payload was unusable.
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::MalformedPayload { .. }
        )
    }
}
