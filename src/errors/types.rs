//! Error types for the portal relay
//!
//! All fallible operations in the crate return [`AppResult`]. Variants are
//! grouped by functional domain and carry their source chain where one
//! exists.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid configuration value for '{key}': {value}")]
    InvalidConfigValue {
        key: String,
        value: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unknown configuration key: {key}")]
    UnknownConfigKey { key: String },

    // Push feed errors
    #[error("Push feed error: {message}")]
    Feed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to connect to push feed at '{url}'")]
    FeedConnection {
        url: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Push feed at '{url}' answered with status {status}")]
    FeedStatus { url: String, status: u16 },

    // Host environment errors
    #[error("Failed to display notification: {reason}")]
    NotificationShow {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to close notification {id}")]
    NotificationClose {
        id: u32,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to open '{url}' in the browser")]
    BrowserLaunch {
        url: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Daemon and IPC errors
    #[error("Daemon error: {message}")]
    Daemon {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Relay daemon is not running")]
    DaemonNotRunning,

    #[error("IPC {operation} failed")]
    Ipc {
        operation: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Filesystem errors
    #[error("I/O error during {operation} on '{}'", path.display())]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_config_value(
        key: impl Into<String>,
        value: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::InvalidConfigValue {
            key: key.into(),
            value: value.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn feed(message: impl Into<String>) -> Self {
        AppError::Feed {
            message: message.into(),
            source: None,
        }
    }

    pub fn feed_connection(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::FeedConnection {
            url: url.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn notification_show(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::NotificationShow {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn notification_close(
        id: u32,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::NotificationClose {
            id,
            source: Some(Box::new(source)),
        }
    }

    pub fn browser_launch(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::BrowserLaunch {
            url: url.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn daemon(message: impl Into<String>) -> Self {
        AppError::Daemon {
            message: message.into(),
            source: None,
        }
    }

    pub fn daemon_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Daemon {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn ipc(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Ipc {
            operation: operation.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn io_with_source(
        path: impl AsRef<Path>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        AppError::Io {
            path: path.as_ref().to_path_buf(),
            operation: operation.into(),
            source,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        AppError::Other {
            message: message.into(),
            source: None,
        }
    }
}
