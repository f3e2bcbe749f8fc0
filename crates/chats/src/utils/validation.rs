//! Payload field validation.
//!
//! Identifiers coming off the channel are treated as absent when they are
//! missing or empty.

use crate::types::{SyncError, SyncResult};

/// Validation helpers for inbound payload fields
pub struct Validator;

impl Validator {
    /// Require a non-empty identifier
    pub fn required(
        event: &'static str,
        field: &'static str,
        value: Option<String>,
    ) -> SyncResult<String> {
        Self::optional(value).ok_or_else(|| SyncError::missing_field(event, field))
    }

    /// Normalise an optional identifier, mapping the empty string to `None`
    pub fn optional(value: Option<String>) -> Option<String> {
        value.filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_empty_values() {
        assert!(Validator::required("typing", "userId", None).is_err());

        let error = Validator::required("typing", "userId", Some(String::new())).unwrap_err();
        assert_eq!(error.to_string(), "Missing field `userId` in typing payload");
    }

    #[test]
    fn required_passes_identifiers_through() {
        let id = Validator::required("typing", "userId", Some("u-1".into())).unwrap();
        assert_eq!(id, "u-1");
    }

    #[test]
    fn optional_drops_empty_strings() {
        assert_eq!(Validator::optional(Some(String::new())), None);
        assert_eq!(Validator::optional(Some("c".into())), Some("c".to_string()));
    }
}
