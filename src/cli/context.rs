//! CLI context for shared state
//!
//! Centralizes configuration management and logging setup so the command
//! handlers stay small.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::ConfigManager;

/// CLI execution context containing shared dependencies and configuration
#[derive(Clone)]
pub struct CliContext {
    pub project_path: Option<PathBuf>,
    pub verbose: bool,
    pub config_manager: Arc<ConfigManager>,
}

impl CliContext {
    pub fn new(project_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let resolved_project_path = Self::resolve_project_path(project_path);
        let config_manager = Arc::new(ConfigManager::new(resolved_project_path.clone())?);

        Ok(Self {
            project_path: resolved_project_path,
            verbose,
            config_manager,
        })
    }

    /// Auto-detect the project by looking for `.portal-relay/config.toml`
    /// in the current directory.
    fn resolve_project_path(project_path: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = project_path {
            return Some(path);
        }

        if let Ok(current_dir) = std::env::current_dir() {
            let config_path = current_dir.join(".portal-relay").join("config.toml");
            if config_path.exists() {
                return Some(current_dir);
            }
        }

        None
    }

    /// Initialize the logging subsystem
    ///
    /// Logs go to a file when `daemon.log_path` is configured, otherwise to
    /// the console. The returned guard must stay alive for the process
    /// lifetime so the file writer gets flushed.
    pub fn init_logging(&self) -> Result<Option<WorkerGuard>> {
        let log_level = if self.verbose {
            "debug"
        } else {
            &self.config_manager.config().daemon.log_level
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(
            log_level
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        );

        if let Some(ref log_path) = self.config_manager.config().daemon.log_path {
            let path = Path::new(log_path);
            let directory = path.parent().unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| "relay.log".into());

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();

            Ok(Some(guard))
        } else {
            tracing_subscriber::fmt().with_env_filter(filter).init();

            if self.verbose {
                tracing::debug!("Verbose logging enabled");
                tracing::debug!("Project path: {:?}", self.project_path);
            }

            Ok(None)
        }
    }
}
