//! Command handlers for all CLI operations
//!
//! Routes parsed commands to their handler structs; only `init` is small
//! enough to live here directly.

pub mod config;
pub mod push;
pub mod run;
pub mod status;

use anyhow::Result;
use std::path::PathBuf;

use super::{CliContext, Commands};
use crate::config::ConfigManager;

/// Coordinates all command handling with shared state from [`CliContext`]
pub struct CommandHandler {
    context: CliContext,
}

impl CommandHandler {
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Route commands to their appropriate handlers
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Run { .. } => run::RunHandler::new(&self.context).handle_run().await,
            Commands::Push {
                data,
                no_daemon,
                dry_run,
            } => {
                push::PushHandler::new(&self.context)
                    .handle_push(data, no_daemon, dry_run)
                    .await
            }
            Commands::Status => status::StatusHandler::new(&self.context).handle_status().await,
            Commands::Stop => status::StatusHandler::new(&self.context).handle_stop().await,
            Commands::Init { global, force } => self.handle_init(global, force).await,
            Commands::Config { action } => {
                config::ConfigHandler::new(&self.context)
                    .handle_config(action)
                    .await
            }
        }
    }

    /// Handle configuration initialization
    async fn handle_init(&self, global: bool, force: bool) -> Result<()> {
        let project_path = if global {
            None
        } else {
            self.context
                .project_path
                .clone()
                .or_else(|| std::env::current_dir().ok())
                .or_else(|| Some(PathBuf::from(".")))
        };

        let config_path = ConfigManager::get_config_path(project_path.clone())?;
        if config_path.exists() {
            if !force {
                println!("Configuration already exists at {}", config_path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }
            std::fs::remove_file(&config_path)?;
        }

        let manager = match project_path {
            Some(path) if !global => ConfigManager::new_project_config(path)?,
            _ => ConfigManager::new(None)?,
        };

        println!(
            "Configuration initialized at {}",
            manager.config_path().display()
        );
        Ok(())
    }
}
