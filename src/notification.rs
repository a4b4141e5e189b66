//! Notification display model
//!
//! Maps a decoded push payload onto the fields handed to the notification
//! host. Title and body come from the payload with configured fallbacks;
//! icon and badge always come from configuration.

use serde::{Deserialize, Serialize};

use crate::config::NotificationConfig;
use crate::push::PushPayload;

/// Display options attached to a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
}

/// A fully derived notification, ready to display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub options: NotificationOptions,
}

impl Notification {
    /// Derive display fields from a payload and the configured defaults
    pub fn compose(payload: &PushPayload, defaults: &NotificationConfig) -> Self {
        Notification {
            title: field_or(payload.title.as_deref(), &defaults.default_title),
            options: NotificationOptions {
                body: field_or(payload.body.as_deref(), &defaults.default_body),
                icon: defaults.icon.clone(),
                badge: defaults.badge.clone(),
            },
        }
    }
}

// An empty string falls back to the default, matching the portal web
// client's truthiness rule rather than a key-present rule.
fn field_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
