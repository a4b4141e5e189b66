//! Relay daemon handler
//!
//! Wires the feed subscriber, the desktop notification host, the browser
//! opener, and the control socket into the dispatch loop and runs it until
//! shutdown.

use anyhow::{Context, Result};
use daemonize::Daemonize;
use std::fs;
use std::sync::Arc;
use tracing::info;

use super::super::CliContext;
use crate::ipc::IpcServer;
use crate::push::FeedSubscriber;
use crate::relay::{
    CommandWindowOpener, DesktopNotifier, NotificationRelay, RelayDispatcher, RelaySettings,
};

/// Detach from the terminal before any async runtime exists
///
/// Must run before the tokio runtime is built; the fork would not carry
/// runtime worker threads across.
pub fn daemonize(context: &CliContext) -> Result<()> {
    let pid_path = context.config_manager.pid_path()?;
    if let Some(dir) = pid_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create runtime directory {}", dir.display()))?;
    }

    let mut daemon = Daemonize::new().pid_file(&pid_path).working_directory("/");

    if let Some(ref log_path) = context.config_manager.config().daemon.log_path {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("Failed to open log file {log_path}"))?;
        daemon = daemon.stdout(file.try_clone()?).stderr(file);
    }

    daemon.start().context("Failed to detach relay daemon")?;
    Ok(())
}

/// Handler for the relay run loop
pub struct RunHandler<'a> {
    context: &'a CliContext,
}

impl<'a> RunHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_run(&self) -> Result<()> {
        let config = self.context.config_manager.config().clone();
        let settings = RelaySettings::from_config(&config)?;

        let (push_tx, push_rx) = flume::bounded(config.daemon.max_queue_size);
        let (click_tx, click_rx) = flume::unbounded();
        let (shutdown_tx, shutdown_rx) = flume::bounded(1);

        let host = Arc::new(
            DesktopNotifier::connect(config.notifications.timeout_ms, click_tx).await?,
        );
        let opener = Arc::new(CommandWindowOpener::new());
        let relay = NotificationRelay::new(host, opener, settings);

        let socket_path = self.context.config_manager.socket_path()?;
        if let Some(dir) = socket_path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create runtime directory {}", dir.display())
            })?;
        }
        let ipc_server = IpcServer::bind(&socket_path, push_tx.clone(), shutdown_tx)?;
        let ipc_handle = tokio::spawn(ipc_server.run());

        let subscriber = FeedSubscriber::new(&config.feed, push_tx.clone())?;
        let feed_handle = tokio::spawn(subscriber.run());

        // Socket and pid files must not outlive the daemon.
        let pid_path = self.context.config_manager.pid_path()?;
        let cleanup_socket = socket_path.clone();
        let _cleanup = scopeguard::guard((), move |_| {
            let _ = fs::remove_file(&cleanup_socket);
            let _ = fs::remove_file(&pid_path);
        });

        // The dispatcher owns the only receiver; our extra sender would keep
        // the queue open forever.
        drop(push_tx);

        info!(
            "portal relay running (feed '{}/{}')",
            config.feed.server_url, config.feed.topic
        );

        let dispatcher = RelayDispatcher::new(relay, push_rx, click_rx, shutdown_rx);
        let result = dispatcher.run().await;

        feed_handle.abort();
        ipc_handle.abort();

        result.map_err(Into::into)
    }
}
