//! Command-line arguments.

use clap::{Parser, Subcommand};

/// Search, combine and summarise spreadsheets stored in Google Drive.
#[derive(Parser, Debug)]
#[command(name = "drivetab", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the web UI
    Serve {
        /// Bind host (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
        /// Open the UI in the default browser
        #[arg(long)]
        open: bool,
    },

    /// Manage Google credentials
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// List folders available for searching
    Folders,

    /// Search a folder tree and summarise the matching spreadsheets
    Search {
        /// Folder ID or exact folder name
        #[arg(short, long)]
        folder: String,
        /// Case-insensitive keyword the file name must contain
        #[arg(short, long)]
        keyword: Option<String>,
        /// File extension, e.g. `.xlsx`
        #[arg(short, long)]
        extension: Option<String>,
        /// Write the combined dataset to this `.csv` or `.xlsx` file
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `auth` subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Authorize drivetab in the browser and cache the credentials
    Login {
        /// Print the consent URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Show which credentials would be used
    Status,
    /// Delete cached user credentials
    Logout,
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Get a value by dotted key, e.g. `server.port`
    Get {
        /// Dotted key
        key: String,
    },
    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Target file (defaults to the platform config directory)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the configuration as environment variables
    Export {
        /// Format as `--env` flags for `docker run`
        #[arg(long)]
        docker_env: bool,
    },
}
