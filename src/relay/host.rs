//! Host environment capability traits
//!
//! The relay only talks to the host environment through these seams:
//! displaying/closing notifications and opening a browser window. The
//! production implementations live in [`super::desktop`] and
//! [`super::browser`]; tests substitute recording fakes.

use async_trait::async_trait;
use url::Url;

use crate::errors::AppResult;
use crate::notification::Notification;

/// Server-assigned identifier of a displayed notification
pub type NotificationId = u32;

/// Displays and dismisses system notifications
#[async_trait]
pub trait NotificationHost: Send + Sync {
    /// Request display of a notification; resolves once the host has
    /// accepted it and returns the assigned id.
    async fn show_notification(&self, notification: &Notification) -> AppResult<NotificationId>;

    /// Dismiss a previously displayed notification
    async fn close_notification(&self, id: NotificationId) -> AppResult<()>;
}

/// Opens a URL in the user's browser
#[async_trait]
pub trait WindowOpener: Send + Sync {
    async fn open_window(&self, url: &Url) -> AppResult<()>;
}
