//! Desktop notification host over the session D-Bus
//!
//! Talks to `org.freedesktop.Notifications`: `Notify` to display,
//! `CloseNotification` to dismiss. Every notification registers a
//! `default` action so a click on the body is reported back through the
//! `ActionInvoked` signal; those signals are filtered to the ids this
//! process created and forwarded as click events into the dispatch queue.
//! `NotificationClosed` signals retire ids from the registry.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flume::Sender;
use futures_util::stream::StreamExt;
use tracing::{debug, warn};
use zbus::zvariant::Value;
use zbus::{Connection, Proxy};

use super::host::{NotificationHost, NotificationId};
use crate::errors::{AppError, AppResult};
use crate::notification::Notification;
use crate::push::NotificationClickEvent;

const NOTIFY_SERVICE: &str = "org.freedesktop.Notifications";
const NOTIFY_PATH: &str = "/org/freedesktop/Notifications";
const NOTIFY_INTERFACE: &str = "org.freedesktop.Notifications";

/// Action key notification servers deliver for a click on the body
const ACTION_DEFAULT: &str = "default";
const ACTION_OPEN_LABEL: &str = "Abrir portal";

const APP_NAME: &str = "portal-relay";

/// Production [`NotificationHost`] backed by the session bus
pub struct DesktopNotifier {
    connection: Connection,
    timeout_ms: i32,
    shown: Arc<Mutex<HashSet<u32>>>,
}

impl DesktopNotifier {
    /// Connect to the session bus and start forwarding clicks on our
    /// notifications into `click_tx`.
    pub async fn connect(
        timeout_ms: Option<i32>,
        click_tx: Sender<NotificationClickEvent>,
    ) -> AppResult<Self> {
        let connection = Connection::session()
            .await
            .map_err(|e| AppError::notification_show("session bus unavailable", e))?;

        let shown = Arc::new(Mutex::new(HashSet::new()));

        tokio::spawn(Self::forward_clicks(
            connection.clone(),
            shown.clone(),
            click_tx,
        ));
        tokio::spawn(Self::retire_closed(connection.clone(), shown.clone()));

        Ok(DesktopNotifier {
            connection,
            timeout_ms: timeout_ms.unwrap_or(-1),
            shown,
        })
    }

    async fn proxy(connection: &Connection) -> zbus::Result<Proxy<'static>> {
        Proxy::new(connection, NOTIFY_SERVICE, NOTIFY_PATH, NOTIFY_INTERFACE).await
    }

    fn owns(shown: &Mutex<HashSet<u32>>, id: u32) -> bool {
        shown.lock().map(|set| set.contains(&id)).unwrap_or(false)
    }

    /// Watch `ActionInvoked` and deliver clicks on our notifications
    async fn forward_clicks(
        connection: Connection,
        shown: Arc<Mutex<HashSet<u32>>>,
        click_tx: Sender<NotificationClickEvent>,
    ) {
        let proxy = match Self::proxy(&connection).await {
            Ok(proxy) => proxy,
            Err(e) => {
                warn!("cannot watch notification clicks: {e}");
                return;
            }
        };
        let mut stream = match proxy.receive_signal("ActionInvoked").await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("cannot subscribe to ActionInvoked: {e}");
                return;
            }
        };

        while let Some(signal) = stream.next().await {
            match signal.body::<(u32, String)>() {
                Ok((id, action)) => {
                    if action == ACTION_DEFAULT && Self::owns(&shown, id) {
                        if click_tx
                            .send_async(NotificationClickEvent {
                                notification_id: id,
                            })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    } else {
                        debug!("ignoring action '{action}' on notification {id}");
                    }
                }
                Err(e) => warn!("bad ActionInvoked signal: {e}"),
            }
        }
    }

    /// Watch `NotificationClosed` and drop retired ids from the registry
    async fn retire_closed(connection: Connection, shown: Arc<Mutex<HashSet<u32>>>) {
        let proxy = match Self::proxy(&connection).await {
            Ok(proxy) => proxy,
            Err(e) => {
                warn!("cannot watch notification closures: {e}");
                return;
            }
        };
        let mut stream = match proxy.receive_signal("NotificationClosed").await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("cannot subscribe to NotificationClosed: {e}");
                return;
            }
        };

        while let Some(signal) = stream.next().await {
            match signal.body::<(u32, u32)>() {
                Ok((id, reason)) => {
                    debug!("notification {id} closed (reason {reason})");
                    if let Ok(mut set) = shown.lock() {
                        set.remove(&id);
                    }
                }
                Err(e) => warn!("bad NotificationClosed signal: {e}"),
            }
        }
    }
}

#[async_trait]
impl NotificationHost for DesktopNotifier {
    async fn show_notification(&self, notification: &Notification) -> AppResult<NotificationId> {
        let proxy = Self::proxy(&self.connection)
            .await
            .map_err(|e| AppError::notification_show("notification service unavailable", e))?;

        let mut hints: HashMap<&str, Value<'_>> = HashMap::new();
        hints.insert("image-path", Value::from(notification.options.badge.as_str()));

        let actions: Vec<&str> = vec![ACTION_DEFAULT, ACTION_OPEN_LABEL];

        let id = proxy
            .call_method(
                "Notify",
                &(
                    APP_NAME,
                    0u32, // never replace an earlier notification
                    notification.options.icon.as_str(),
                    notification.title.as_str(),
                    notification.options.body.as_str(),
                    actions,
                    hints,
                    self.timeout_ms,
                ),
            )
            .await
            .map_err(|e| AppError::notification_show("Notify call failed", e))?
            .body::<u32>()
            .map_err(|e| AppError::notification_show("unexpected Notify reply", e))?;

        if let Ok(mut set) = self.shown.lock() {
            set.insert(id);
        }
        Ok(id)
    }

    async fn close_notification(&self, id: NotificationId) -> AppResult<()> {
        let proxy = Self::proxy(&self.connection)
            .await
            .map_err(|e| AppError::notification_close(id, e))?;

        proxy
            .call_method("CloseNotification", &(id))
            .await
            .map_err(|e| AppError::notification_close(id, e))?;

        if let Ok(mut set) = self.shown.lock() {
            set.remove(&id);
        }
        Ok(())
    }
}
