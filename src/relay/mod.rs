//! The notification relay
//!
//! Two independent event handlers over host-supplied capabilities: an
//! incoming push becomes a displayed notification, and a click on one of
//! our notifications dismisses it and opens the portal. There is no state
//! shared between the handlers and nothing persists across events.

pub mod browser;
pub mod desktop;
pub mod dispatcher;
pub mod host;

pub use browser::CommandWindowOpener;
pub use desktop::DesktopNotifier;
pub use dispatcher::RelayDispatcher;
pub use host::{NotificationHost, NotificationId, WindowOpener};

use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{Config, NotificationConfig};
use crate::errors::AppResult;
use crate::notification::Notification;
use crate::push::{NotificationClickEvent, PushEvent, PushPayload};

/// Relay behavior resolved from configuration
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub defaults: NotificationConfig,
    pub portal_url: Url,
}

impl RelaySettings {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(RelaySettings {
            defaults: config.notifications.clone(),
            portal_url: config.portal_url()?,
        })
    }
}

/// Event handlers bridging push events to the host environment
pub struct NotificationRelay<H, W> {
    host: Arc<H>,
    opener: Arc<W>,
    settings: RelaySettings,
}

impl<H, W> NotificationRelay<H, W>
where
    H: NotificationHost,
    W: WindowOpener,
{
    pub fn new(host: Arc<H>, opener: Arc<W>, settings: RelaySettings) -> Self {
        NotificationRelay {
            host,
            opener,
            settings,
        }
    }

    /// Derive a notification from the push payload and display it
    ///
    /// The returned future resolves only once the display request has; the
    /// caller must keep the event alive until then. Payload decode cannot
    /// fail (bad payloads degrade to the configured defaults), so the only
    /// error path is the display request itself.
    pub async fn handle_push(&self, event: PushEvent) -> AppResult<NotificationId> {
        let payload = PushPayload::decode(event.data.as_deref());
        let notification = Notification::compose(&payload, &self.settings.defaults);

        debug!(
            title = %notification.title,
            feed_id = event.id.as_deref().unwrap_or("-"),
            "displaying push notification"
        );

        let id = self.host.show_notification(&notification).await?;
        info!("displayed notification {id} ({})", notification.title);
        Ok(id)
    }

    /// Dismiss the clicked notification and open the portal
    ///
    /// Dismissal happens first and is fire-and-forget: a close failure is
    /// logged but never suppresses the open-window request. An open-window
    /// failure propagates to the dispatch loop.
    pub async fn handle_notification_click(
        &self,
        event: NotificationClickEvent,
    ) -> AppResult<()> {
        if let Err(e) = self.host.close_notification(event.notification_id).await {
            warn!(
                "failed to close notification {}: {e}",
                event.notification_id
            );
        }

        self.opener.open_window(&self.settings.portal_url).await?;
        info!("opened portal at {}", self.settings.portal_url);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording fakes shared by the relay and dispatcher tests

    use super::*;
    use crate::errors::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Host fake recording every call, with optional failure injection
    #[derive(Default)]
    pub struct RecordingHost {
        pub shown: Mutex<Vec<Notification>>,
        pub closed: Mutex<Vec<NotificationId>>,
        pub next_id: AtomicU32,
        pub fail_show: bool,
        pub fail_close: bool,
    }

    #[async_trait]
    impl NotificationHost for RecordingHost {
        async fn show_notification(
            &self,
            notification: &Notification,
        ) -> AppResult<NotificationId> {
            if self.fail_show {
                return Err(AppError::NotificationShow {
                    reason: "injected".to_string(),
                    source: None,
                });
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            self.shown.lock().unwrap().push(notification.clone());
            Ok(id)
        }

        async fn close_notification(&self, id: NotificationId) -> AppResult<()> {
            if self.fail_close {
                return Err(AppError::NotificationClose { id, source: None });
            }
            self.closed.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingOpener {
        pub opened: Mutex<Vec<Url>>,
    }

    #[async_trait]
    impl WindowOpener for RecordingOpener {
        async fn open_window(&self, url: &Url) -> AppResult<()> {
            self.opened.lock().unwrap().push(url.clone());
            Ok(())
        }
    }

    /// Opener that appends to the same call log as a host, for ordering
    /// assertions
    pub struct SequencedOpener {
        pub log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl WindowOpener for SequencedOpener {
        async fn open_window(&self, url: &Url) -> AppResult<()> {
            self.log.lock().unwrap().push(format!("open:{url}"));
            Ok(())
        }
    }

    /// Host that appends to a shared call log, for ordering assertions
    pub struct SequencedHost {
        pub log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl NotificationHost for SequencedHost {
        async fn show_notification(&self, _n: &Notification) -> AppResult<NotificationId> {
            self.log.lock().unwrap().push("show".to_string());
            Ok(1)
        }

        async fn close_notification(&self, id: NotificationId) -> AppResult<()> {
            self.log.lock().unwrap().push(format!("close:{id}"));
            Ok(())
        }
    }

    pub fn settings() -> RelaySettings {
        RelaySettings {
            defaults: NotificationConfig::default(),
            portal_url: Url::parse("https://alessandradonadon.com/portal").unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::push::PushEvent;

    fn relay_with(
        host: Arc<RecordingHost>,
        opener: Arc<RecordingOpener>,
    ) -> NotificationRelay<RecordingHost, RecordingOpener> {
        NotificationRelay::new(host, opener, settings())
    }

    #[tokio::test]
    async fn test_push_with_payload_displays_payload_fields() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let relay = relay_with(host.clone(), opener);

        let event = PushEvent::new(Some(br#"{"title":"T","body":"B"}"#.to_vec()));
        relay.handle_push(event).await.unwrap();

        let shown = host.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "T");
        assert_eq!(shown[0].options.body, "B");
    }

    #[tokio::test]
    async fn test_push_without_payload_displays_defaults() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let relay = relay_with(host.clone(), opener);

        relay.handle_push(PushEvent::new(None)).await.unwrap();

        let shown = host.shown.lock().unwrap();
        assert_eq!(shown[0].title, "Nova Atualização Jurídica");
        assert_eq!(
            shown[0].options.body,
            "Um novo andamento foi detectado em seu processo."
        );
    }

    #[tokio::test]
    async fn test_push_with_title_only_falls_back_for_body() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let relay = relay_with(host.clone(), opener);

        let event = PushEvent::new(Some(br#"{"title":"T"}"#.to_vec()));
        relay.handle_push(event).await.unwrap();

        let shown = host.shown.lock().unwrap();
        assert_eq!(shown[0].title, "T");
        assert_eq!(
            shown[0].options.body,
            "Um novo andamento foi detectado em seu processo."
        );
    }

    #[tokio::test]
    async fn test_icon_and_badge_are_fixed_regardless_of_payload() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let relay = relay_with(host.clone(), opener);

        let event = PushEvent::new(Some(
            br#"{"title":"T","icon":"/evil.png","badge":"/evil2.png"}"#.to_vec(),
        ));
        relay.handle_push(event).await.unwrap();

        let shown = host.shown.lock().unwrap();
        assert_eq!(shown[0].options.icon, "/static/images/logo.png");
        assert_eq!(shown[0].options.badge, "/static/images/icon.png");
    }

    #[tokio::test]
    async fn test_malformed_payload_never_fails_the_handler() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let relay = relay_with(host.clone(), opener);

        let event = PushEvent::new(Some(b"{broken".to_vec()));
        let result = relay.handle_push(event).await;

        assert!(result.is_ok());
        let shown = host.shown.lock().unwrap();
        assert_eq!(shown[0].title, "Nova Atualização Jurídica");
    }

    #[tokio::test]
    async fn test_display_failure_propagates() {
        let host = Arc::new(RecordingHost {
            fail_show: true,
            ..Default::default()
        });
        let opener = Arc::new(RecordingOpener::default());
        let relay = relay_with(host, opener);

        assert!(relay.handle_push(PushEvent::new(None)).await.is_err());
    }

    #[tokio::test]
    async fn test_click_closes_once_and_opens_portal_once() {
        let host = Arc::new(RecordingHost::default());
        let opener = Arc::new(RecordingOpener::default());
        let relay = relay_with(host.clone(), opener.clone());

        relay
            .handle_notification_click(NotificationClickEvent { notification_id: 7 })
            .await
            .unwrap();

        assert_eq!(host.closed.lock().unwrap().as_slice(), &[7]);
        let opened = opener.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].as_str(), "https://alessandradonadon.com/portal");
    }

    #[tokio::test]
    async fn test_click_closes_before_opening() {
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let host = Arc::new(SequencedHost { log: log.clone() });
        let opener = Arc::new(SequencedOpener { log: log.clone() });
        let relay = NotificationRelay::new(host, opener, settings());

        relay
            .handle_notification_click(NotificationClickEvent { notification_id: 3 })
            .await
            .unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            log.as_slice(),
            &[
                "close:3".to_string(),
                "open:https://alessandradonadon.com/portal".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_close_failure_does_not_suppress_open() {
        let host = Arc::new(RecordingHost {
            fail_close: true,
            ..Default::default()
        });
        let opener = Arc::new(RecordingOpener::default());
        let relay = relay_with(host, opener.clone());

        relay
            .handle_notification_click(NotificationClickEvent { notification_id: 9 })
            .await
            .unwrap();

        assert_eq!(opener.opened.lock().unwrap().len(), 1);
    }
}
