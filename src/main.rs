use anyhow::Result;

mod cli;
mod config;
mod errors;
mod ipc;
mod notification;
mod push;
mod relay;

use cli::CliApp;

fn main() -> Result<()> {
    CliApp::run()
}
