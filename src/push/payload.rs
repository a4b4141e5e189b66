//! Push payload decoding
//!
//! A push event may carry an optional JSON payload with display fields.
//! Decoding is deliberately infallible: a push without a payload, or with
//! bytes that do not parse as a JSON object, degrades to the empty payload
//! and the notification falls back to the configured defaults. The parse
//! failure is only logged, never surfaced to the caller.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sender-supplied display fields, all optional
///
/// No schema is enforced beyond the two known fields; unknown fields are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl PushPayload {
    /// Decode an optional payload, substituting the empty payload on
    /// absence or parse failure.
    pub fn decode(data: Option<&[u8]>) -> Self {
        let Some(raw) = data else {
            return PushPayload::default();
        };

        match serde_json::from_slice(raw) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("discarding malformed push payload: {err}");
                PushPayload::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_payload() {
        let payload = PushPayload::decode(Some(br#"{"title":"T","body":"B"}"#));
        assert_eq!(payload.title.as_deref(), Some("T"));
        assert_eq!(payload.body.as_deref(), Some("B"));
    }

    #[test]
    fn test_decode_title_only() {
        let payload = PushPayload::decode(Some(br#"{"title":"T"}"#));
        assert_eq!(payload.title.as_deref(), Some("T"));
        assert_eq!(payload.body, None);
    }

    #[test]
    fn test_decode_absent_payload_is_empty() {
        let payload = PushPayload::decode(None);
        assert!(payload.is_empty());
    }

    #[test]
    fn test_decode_malformed_json_is_empty() {
        let payload = PushPayload::decode(Some(b"{not json"));
        assert!(payload.is_empty());
    }

    #[test]
    fn test_decode_non_object_json_is_empty() {
        assert!(PushPayload::decode(Some(b"[1,2,3]")).is_empty());
        assert!(PushPayload::decode(Some(b"\"text\"")).is_empty());
        assert!(PushPayload::decode(Some(b"42")).is_empty());
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let payload =
            PushPayload::decode(Some(br#"{"title":"T","case_id":"0001234-56.2026"}"#));
        assert_eq!(payload.title.as_deref(), Some("T"));
        assert_eq!(payload.body, None);
    }
}
