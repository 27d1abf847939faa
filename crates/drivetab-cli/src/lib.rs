//! # drivetab-cli
//!
//! The `drivetab` command:
//! - `serve`: the web UI
//! - `auth`: log in, check and forget Google credentials
//! - `folders` and `search`: the same search and summary from the terminal
//! - `config`: inspect and edit the configuration file

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config_handlers;

use drivetab_core::{ConfigManager, DrivetabConfig, Result};

use crate::cli::{Cli, Command};
use crate::commands::SearchArgs;

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let mut out = std::io::stdout();

    match cli.command {
        Command::Config { action } => config_handlers::handle_config_command(config_path, action),
        Command::Serve { host, port, open } => {
            commands::cmd_serve(load_config(config_path)?, host, port, open).await
        }
        Command::Auth { action } => {
            commands::cmd_auth(&load_config(config_path)?, action, &mut out).await
        }
        Command::Folders => commands::cmd_folders(&load_config(config_path)?, &mut out).await,
        Command::Search {
            folder,
            keyword,
            extension,
            out: target,
        } => {
            let args = SearchArgs {
                folder,
                keyword,
                extension,
                out: target,
            };
            commands::cmd_search(&load_config(config_path)?, args, &mut out).await
        }
    }
}

/// Load and validate the configuration.
pub fn load_config(config_path: Option<&str>) -> Result<DrivetabConfig> {
    let config = DrivetabConfig::load(config_path)?;
    config.validate()?;
    tracing::debug!(?config_path, "configuration loaded");
    Ok(config)
}
