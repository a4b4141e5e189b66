//! CLI module providing command-line interface functionality

pub mod commands;
pub mod context;
pub mod handlers;

use anyhow::Result;
use clap::Parser;

pub use commands::{Cli, Commands, ConfigAction};
pub use context::CliContext;
pub use handlers::CommandHandler;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Parse command line arguments and execute the requested command
    ///
    /// The async runtime is only built after a possible `run --detach`
    /// fork; worker threads would not survive the fork.
    pub fn run() -> Result<()> {
        let cli = Cli::parse();

        let context = CliContext::new(cli.project.clone(), cli.verbose)?;

        // Default to running the relay when called without a subcommand.
        let command = cli.command.unwrap_or(Commands::Run { detach: false });

        if let Commands::Run { detach: true } = command {
            handlers::run::daemonize(&context)?;
        }

        let _guard = context.init_logging()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(CommandHandler::new(context).handle_command(command))
    }
}
