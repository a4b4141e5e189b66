//! Configuration for the portal relay
//!
//! Handles loading, saving, and managing configuration for both
//! project-level and global configurations. Project configurations take
//! precedence over global ones.
//!
//! # Configuration Hierarchy
//!
//! 1. **Project-level**: `.portal-relay/config.toml` in the project root
//! 2. **Global**: `~/.portal-relay/config.toml` in the user home directory

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::errors::{AppError, AppResult};

/// Notification title used when the push payload carries none.
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Nova Atualização Jurídica";

/// Notification body used when the push payload carries none.
pub const DEFAULT_NOTIFICATION_BODY: &str =
    "Um novo andamento foi detectado em seu processo.";

/// Icon shown on every notification, regardless of payload.
pub const DEFAULT_NOTIFICATION_ICON: &str = "/static/images/logo.png";

/// Badge shown on every notification, regardless of payload.
pub const DEFAULT_NOTIFICATION_BADGE: &str = "/static/images/icon.png";

/// Portal page opened when a notification is clicked.
pub const DEFAULT_PORTAL_URL: &str = "https://alessandradonadon.com/portal";

/// Push gateway the relay subscribes to.
pub const DEFAULT_FEED_SERVER_URL: &str = "https://push.alessandradonadon.com";

/// Feed topic carrying case-update pushes.
pub const DEFAULT_FEED_TOPIC: &str = "portal-updates";

const CONFIG_DIR: &str = ".portal-relay";
const CONFIG_FILE: &str = "config.toml";
const SOCKET_FILE: &str = "relay.sock";
const PID_FILE: &str = "relay.pid";

/// Main configuration structure for the portal relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Settings for the push feed subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub server_url: String,
    pub topic: String,
    pub auth_token: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,
}

/// Display fields applied to notifications; the defaults are what the
/// relay shows when a push carries no usable payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub default_title: String,
    pub default_body: String,
    pub icon: String,
    pub badge: String,
    /// Expire timeout handed to the notification server, -1 for its default.
    pub timeout_ms: Option<i32>,
}

/// Where a notification click takes the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    pub socket_path: Option<PathBuf>,
    pub log_level: String,
    pub log_path: Option<String>,
    pub max_queue_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            server_url: DEFAULT_FEED_SERVER_URL.to_string(),
            topic: DEFAULT_FEED_TOPIC.to_string(),
            auth_token: None,
            connect_timeout_secs: Some(15),
            reconnect_base_ms: 1_000,
            reconnect_max_ms: 60_000,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            default_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            default_body: DEFAULT_NOTIFICATION_BODY.to_string(),
            icon: DEFAULT_NOTIFICATION_ICON.to_string(),
            badge: DEFAULT_NOTIFICATION_BADGE.to_string(),
            timeout_ms: None,
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            url: DEFAULT_PORTAL_URL.to_string(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            socket_path: None,
            log_level: "info".to_string(),
            log_path: None,
            max_queue_size: 1000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            feed: FeedConfig::default(),
            notifications: NotificationConfig::default(),
            portal: PortalConfig::default(),
            daemon: DaemonConfig::default(),
        }
    }
}

impl Config {
    /// Portal URL as a parsed [`Url`]
    pub fn portal_url(&self) -> AppResult<Url> {
        Url::parse(&self.portal.url)
            .map_err(|e| AppError::invalid_config_value("portal.url", &self.portal.url, e))
    }

    /// Read a configuration value by dotted key
    pub fn get_key(&self, key: &str) -> AppResult<String> {
        let value = match key {
            "feed.server_url" => self.feed.server_url.clone(),
            "feed.topic" => self.feed.topic.clone(),
            "feed.auth_token" => self.feed.auth_token.clone().unwrap_or_default(),
            "notifications.default_title" => self.notifications.default_title.clone(),
            "notifications.default_body" => self.notifications.default_body.clone(),
            "notifications.icon" => self.notifications.icon.clone(),
            "notifications.badge" => self.notifications.badge.clone(),
            "portal.url" => self.portal.url.clone(),
            "daemon.log_level" => self.daemon.log_level.clone(),
            "daemon.log_path" => self.daemon.log_path.clone().unwrap_or_default(),
            "daemon.max_queue_size" => self.daemon.max_queue_size.to_string(),
            _ => {
                return Err(AppError::UnknownConfigKey {
                    key: key.to_string(),
                })
            }
        };
        Ok(value)
    }

    /// Set a configuration value by dotted key
    ///
    /// URL-valued keys are parsed before being accepted so a typo does not
    /// end up persisted.
    pub fn set_key(&mut self, key: &str, value: &str) -> AppResult<()> {
        match key {
            "feed.server_url" => {
                Url::parse(value)
                    .map_err(|e| AppError::invalid_config_value(key, value, e))?;
                self.feed.server_url = value.to_string();
            }
            "feed.topic" => self.feed.topic = value.to_string(),
            "feed.auth_token" => self.feed.auth_token = Some(value.to_string()),
            "notifications.default_title" => {
                self.notifications.default_title = value.to_string()
            }
            "notifications.default_body" => {
                self.notifications.default_body = value.to_string()
            }
            "notifications.icon" => self.notifications.icon = value.to_string(),
            "notifications.badge" => self.notifications.badge = value.to_string(),
            "portal.url" => {
                Url::parse(value)
                    .map_err(|e| AppError::invalid_config_value(key, value, e))?;
                self.portal.url = value.to_string();
            }
            "daemon.log_level" => self.daemon.log_level = value.to_string(),
            "daemon.log_path" => self.daemon.log_path = Some(value.to_string()),
            "daemon.max_queue_size" => {
                self.daemon.max_queue_size = value
                    .parse()
                    .map_err(|e| AppError::invalid_config_value(key, value, e))?;
            }
            _ => {
                return Err(AppError::UnknownConfigKey {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Configuration manager for the portal relay
///
/// Loads project configuration when present, falling back to (or creating)
/// the global one.
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Load configuration for the given project path, or the global
    /// configuration when `None`.
    pub fn new(project_path: Option<PathBuf>) -> AppResult<Self> {
        if let Some(ref path) = project_path {
            let project_config_path = Self::get_config_path(Some(path.clone()))?;

            if project_config_path.exists() {
                let config = Self::load_or_create(&project_config_path)?;
                return Ok(ConfigManager {
                    config_path: project_config_path,
                    config,
                });
            }

            let global_config_path = Self::get_config_path(None)?;
            if global_config_path.exists() {
                let config = Self::load_or_create(&global_config_path)?;
                return Ok(ConfigManager {
                    config_path: global_config_path,
                    config,
                });
            }

            // Neither exists yet; the project asked, the project gets one.
            let config = Self::load_or_create(&project_config_path)?;
            Ok(ConfigManager {
                config_path: project_config_path,
                config,
            })
        } else {
            let config_path = Self::get_config_path(None)?;
            let config = Self::load_or_create(&config_path)?;
            Ok(ConfigManager {
                config_path,
                config,
            })
        }
    }

    /// Always create or use project-level configuration, even if a global
    /// config exists. Used by `init` without `--global`.
    pub fn new_project_config(project_path: PathBuf) -> AppResult<Self> {
        let config_path = Self::get_config_path(Some(project_path))?;
        let config = Self::load_or_create(&config_path)?;

        Ok(ConfigManager {
            config_path,
            config,
        })
    }

    pub fn get_config_path(project_path: Option<PathBuf>) -> AppResult<PathBuf> {
        let base_path = match project_path {
            Some(path) => path.join(CONFIG_DIR),
            None => global_config_dir()?,
        };

        fs::create_dir_all(&base_path)
            .map_err(|e| AppError::io_with_source(&base_path, "create config directory", e))?;

        Ok(base_path.join(CONFIG_FILE))
    }

    fn load_or_create(path: &Path) -> AppResult<Config> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| AppError::io_with_source(path, "read config file", e))?;
            toml::from_str(&content)
                .map_err(|e| AppError::config_with_source("Failed to parse config file", e))
        } else {
            let config = Config::default();
            let content = toml::to_string_pretty(&config)
                .map_err(|e| AppError::config_with_source("Failed to serialize default config", e))?;
            fs::write(path, content)
                .map_err(|e| AppError::io_with_source(path, "write default config", e))?;
            Ok(config)
        }
    }

    /// Persist the current configuration back to the file it came from
    pub fn save(&self) -> AppResult<()> {
        let content = toml::to_string_pretty(&self.config)
            .map_err(|e| AppError::config_with_source("Failed to serialize config", e))?;
        fs::write(&self.config_path, content)
            .map_err(|e| AppError::io_with_source(&self.config_path, "write config file", e))?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Control socket path: configured override or the global default
    pub fn socket_path(&self) -> AppResult<PathBuf> {
        if let Some(ref path) = self.config.daemon.socket_path {
            return Ok(path.clone());
        }
        Ok(global_config_dir()?.join(SOCKET_FILE))
    }

    /// Pid file written by `run --detach`, sibling of the socket
    pub fn pid_path(&self) -> AppResult<PathBuf> {
        Ok(self.socket_path()?.with_file_name(PID_FILE))
    }
}

fn global_config_dir() -> AppResult<PathBuf> {
    let base_dirs =
        BaseDirs::new().ok_or_else(|| AppError::config("Failed to get base directories"))?;
    Ok(base_dirs.home_dir().join(CONFIG_DIR))
}
