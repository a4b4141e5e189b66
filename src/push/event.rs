//! Event types delivered to the relay handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An incoming push event carrying zero or one opaque payload
///
/// Events arrive either from the feed subscriber or over the control
/// socket; both paths produce the same type, so they are serializable for
/// the IPC framing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// Feed-assigned message id, when the source provides one
    pub id: Option<String>,

    /// Raw payload bytes; `None` models a push without a body
    pub data: Option<Vec<u8>>,

    /// When the relay received the event
    pub received_at: DateTime<Utc>,
}

impl PushEvent {
    pub fn new(data: Option<Vec<u8>>) -> Self {
        PushEvent {
            id: None,
            data,
            received_at: Utc::now(),
        }
    }
}

/// A user click on a notification the relay displayed
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NotificationClickEvent {
    /// Server-assigned id of the clicked notification
    pub notification_id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_event_without_payload() {
        let event = PushEvent::new(None);
        assert!(event.data.is_none());
        assert!(event.id.is_none());
    }

    #[test]
    fn test_push_event_serde_roundtrip() {
        let event = PushEvent {
            id: Some("m1".to_string()),
            data: Some(b"{}".to_vec()),
            received_at: Utc::now(),
        };
        let encoded = bincode::serialize(&event).unwrap();
        let decoded: PushEvent = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded.id.as_deref(), Some("m1"));
        assert_eq!(decoded.data.as_deref(), Some(b"{}".as_slice()));
    }
}
