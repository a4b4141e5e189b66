//! Daemon status and stop handlers

use anyhow::Result;

use super::super::CliContext;
use crate::errors::AppError;
use crate::ipc::convenience::{relay_status, shutdown_relay};
use crate::ipc::RelayResponse;

/// Handler for daemon status queries and shutdown
pub struct StatusHandler<'a> {
    context: &'a CliContext,
}

impl<'a> StatusHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_status(&self) -> Result<()> {
        let socket_path = self.context.config_manager.socket_path()?;

        match relay_status(&socket_path).await {
            Ok(RelayResponse::Status {
                queue_size,
                uptime_secs,
            }) => {
                println!("Relay daemon is running");
                println!("Queued events: {queue_size}");
                println!("Uptime: {uptime_secs}s");
            }
            Ok(other) => println!("Relay daemon answered unexpectedly: {other:?}"),
            Err(AppError::DaemonNotRunning) => println!("Relay daemon is not running"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub async fn handle_stop(&self) -> Result<()> {
        let socket_path = self.context.config_manager.socket_path()?;

        match shutdown_relay(&socket_path).await {
            Ok(_) => println!("Relay daemon stopping"),
            Err(AppError::DaemonNotRunning) => println!("Relay daemon is not running"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}
