//! Configuration management handler

use anyhow::Result;

use super::super::{CliContext, ConfigAction};
use crate::config::ConfigManager;

/// Handler for configuration operations
pub struct ConfigHandler<'a> {
    context: &'a CliContext,
}

impl<'a> ConfigHandler<'a> {
    pub fn new(context: &'a CliContext) -> Self {
        Self { context }
    }

    pub async fn handle_config(&self, action: ConfigAction) -> Result<()> {
        match action {
            ConfigAction::Show => {
                let manager = &self.context.config_manager;
                println!("Configuration at {}:", manager.config_path().display());
                println!();
                println!("{}", toml::to_string_pretty(manager.config())?);
                Ok(())
            }

            ConfigAction::Get { key } => {
                let value = self.context.config_manager.config().get_key(&key)?;
                println!("{value}");
                Ok(())
            }

            ConfigAction::Set { key, value } => {
                // The shared manager is read-only; mutate through a fresh
                // one bound to the same file.
                let mut manager = ConfigManager::new(self.context.project_path.clone())?;
                manager.config_mut().set_key(&key, &value)?;
                manager.save()?;
                println!("Set {key} = {value}");
                Ok(())
            }
        }
    }
}
