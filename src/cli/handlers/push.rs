//! Push injection handler
//!
//! Builds a push event from `--data` or stdin and either hands it to the
//! running relay daemon over the control socket or displays it directly.

use anyhow::{Context, Result};
use std::io::{self, Read};
use std::sync::Arc;
use tracing::debug;

use super::super::CliContext;
use crate::errors::AppError;
use crate::ipc::convenience::submit_push_event;
use crate::notification::Notification;
use crate::push::{PushEvent, PushPayload};
use crate::relay::{CommandWindowOpener, DesktopNotifier, NotificationRelay, RelaySettings};

/// Handler for push event injection
pub struct PushHandler<'a> {
    context: &'a CliContext,
}

impl<'a> PushHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_push(
        &self,
        data: Option<String>,
        no_daemon: bool,
        dry_run: bool,
    ) -> Result<()> {
        let raw = match data {
            Some(data) => Some(data),
            None => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read push payload from stdin")?;
                // Empty input models a push event without a payload.
                if buffer.trim().is_empty() {
                    None
                } else {
                    Some(buffer)
                }
            }
        };

        let event = PushEvent::new(raw.map(String::into_bytes));

        if dry_run {
            let payload = PushPayload::decode(event.data.as_deref());
            let notification = Notification::compose(
                &payload,
                &self.context.config_manager.config().notifications,
            );
            println!("Dry run - would display notification:");
            println!("Title: {}", notification.title);
            println!("Body: {}", notification.options.body);
            println!("Icon: {}", notification.options.icon);
            println!("Badge: {}", notification.options.badge);
            return Ok(());
        }

        if !no_daemon {
            let socket_path = self.context.config_manager.socket_path()?;
            match submit_push_event(&socket_path, event.clone()).await {
                Ok(()) => {
                    println!("Push event submitted to relay daemon");
                    return Ok(());
                }
                Err(AppError::DaemonNotRunning) => {
                    debug!("relay daemon not running, displaying directly");
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.display_directly(event).await
    }

    /// One-shot display without a daemon
    async fn display_directly(&self, event: PushEvent) -> Result<()> {
        let config = self.context.config_manager.config();
        let settings = RelaySettings::from_config(config)?;

        // Nothing will service clicks once this process exits.
        let (click_tx, _click_rx) = flume::unbounded();
        let host = Arc::new(
            DesktopNotifier::connect(config.notifications.timeout_ms, click_tx).await?,
        );
        let opener = Arc::new(CommandWindowOpener::new());
        let relay = NotificationRelay::new(host, opener, settings);

        let id = relay.handle_push(event).await?;
        println!("Displayed notification {id}");
        println!("Note: click handling requires the relay daemon ('portal-relay run')");
        Ok(())
    }
}
