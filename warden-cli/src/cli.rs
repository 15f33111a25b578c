//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Account a command calculates permissions for
#[derive(clap::Args, Debug, Clone)]
pub struct AccountArgs {
    /// Account ID, 0 for the anonymous account
    #[arg(long, value_name = "ID", default_value_t = 0)]
    pub account: u64,

    /// Global role held by the account (repeatable)
    #[arg(long = "role", value_name = "ROLE")]
    pub roles: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the permissions an account has, as JSON
    Resolve {
        /// Group fixture (YAML)
        #[arg(long, value_name = "PATH")]
        fixture: PathBuf,

        #[command(flatten)]
        account: AccountArgs,

        /// Only resolve this scope (individual, insider, outsider)
        #[arg(long, value_name = "SCOPE")]
        scope: Option<String>,
    },

    /// Print the query restriction for an entity kind and operation, as JSON
    Restrict {
        /// Group fixture (YAML)
        #[arg(long, value_name = "PATH")]
        fixture: PathBuf,

        #[command(flatten)]
        account: AccountArgs,

        /// Entity kind declared in the fixture
        #[arg(long, value_name = "KIND")]
        entity: String,

        /// Operation to restrict for
        #[arg(long, value_name = "OPERATION", default_value = "view")]
        operation: String,
    },

    /// Check a single permission in a single group
    Check {
        /// Group fixture (YAML)
        #[arg(long, value_name = "PATH")]
        fixture: PathBuf,

        #[command(flatten)]
        account: AccountArgs,

        /// Group ID
        #[arg(long, value_name = "ID")]
        group: i64,

        /// Permission name
        #[arg(long, value_name = "PERMISSION")]
        permission: String,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}
