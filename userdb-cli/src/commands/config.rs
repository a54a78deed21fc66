//! Config inspection commands

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the default config file path
    Path,
    /// Print the effective config (file + environment), secrets masked
    Show,
}

pub fn run_config(args: ConfigArgs, config: AppConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", AppConfig::default_path().display());
        }
        ConfigCommands::Show => {
            let toml_str = toml::to_string_pretty(&config.redacted())
                .context("Failed to serialize config to TOML")?;
            println!("{}", toml_str);
        }
    }
    Ok(())
}
