use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::output::OutputFormat;
use crate::config::{user_config_path, AppConfig};

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (default)
    Show,
    /// Print where the per-user configuration file is looked up
    Path,
    /// Validate the configuration and exit
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, config: Arc<AppConfig>, output: OutputFormat) -> Result<()> {
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => output.print_document(&config.redacted()),
        ConfigAction::Path => {
            match user_config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("[no configuration directory on this platform]"),
            }
            Ok(())
        }
        ConfigAction::Validate => {
            config.validate()?;
            println!("configuration OK");
            Ok(())
        }
    }
}
