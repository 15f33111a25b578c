use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use warden_config::{ConfigLoader, LogLevel, WardenConfig};

mod cli;
mod commands;
mod fixture;
mod settings;

use cli::{Cli, Commands, ConfigCommands};

fn load_config(config_path: Option<&PathBuf>) -> Result<WardenConfig> {
    let config = ConfigLoader::new()
        .load(config_path)
        .context("Failed to load configuration")?;
    Ok(config)
}

/// Initialize logging, letting `--log-level` override the configured level
fn init_logging(config: &WardenConfig, log_level: Option<&String>) -> Result<()> {
    let mut logging_config = config.logging.clone();
    if let Some(level_str) = log_level {
        match level_str.parse::<LogLevel>() {
            Ok(level) => logging_config.level = level,
            Err(e) => eprintln!("{}, keeping configured level", e),
        }
    }

    warden_logging::init_logging_from_config(&logging_config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config validate` reports problems with the file itself
    let config = match &cli.command {
        Some(Commands::Config {
            config_cmd: ConfigCommands::Validate { .. },
        }) => WardenConfig::default(),
        _ => load_config(cli.config.as_ref())?,
    };

    init_logging(&config, cli.log_level.as_ref())?;
    debug!("Warden CLI starting");

    match &cli.command {
        Some(Commands::Resolve {
            fixture,
            account,
            scope,
        }) => {
            let collection = commands::permissions::resolve(&config, fixture, account, scope.as_deref()).await?;
            print_json(&collection)
        }
        Some(Commands::Restrict {
            fixture,
            account,
            entity,
            operation,
        }) => {
            let restriction = commands::permissions::restrict(&config, fixture, account, entity, operation).await?;
            print_json(&restriction)
        }
        Some(Commands::Check {
            fixture,
            account,
            group,
            permission,
        }) => {
            let granted = commands::permissions::check(&config, fixture, account, *group, permission).await?;
            info!("Checked '{}' in group {}", permission, group);
            println!("{}", if granted { "granted" } else { "denied" });
            Ok(())
        }
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { config_file } => commands::config::validate(config_file),
            ConfigCommands::Generate { output, force } => commands::config::generate(output, *force),
            ConfigCommands::Show { format } => {
                println!("{}", commands::config::show(&config, format)?);
                Ok(())
            }
        },
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}
