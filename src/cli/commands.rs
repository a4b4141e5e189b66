//! Command definitions and structures for the CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure
#[derive(Parser)]
#[command(name = "portal-relay")]
#[command(about = "Client portal push notification relay for the desktop")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project path for project-level configuration
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the relay: subscribe to the push feed and display notifications
    /// (default mode when no subcommand)
    Run {
        /// Detach and run in the background
        #[arg(short = 'd', long)]
        detach: bool,
    },

    /// Inject a single push event
    Push {
        /// Payload JSON; reads stdin when omitted, empty input means a push
        /// without payload
        #[arg(long, env = "PORTAL_PUSH_DATA")]
        data: Option<String>,

        /// Don't hand the event to a running daemon, display it directly
        #[arg(long)]
        no_daemon: bool,

        /// Print the composed notification without displaying it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show relay daemon status
    Status,

    /// Stop a running relay daemon
    Stop,

    /// Initialize configuration
    Init {
        /// Initialize global configuration (default is project-level)
        #[arg(short, long)]
        global: bool,

        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key (e.g., portal.url)
        key: String,
        /// Value to set
        value: String,
    },

    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },
}
