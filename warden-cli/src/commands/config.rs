//! Configuration commands

use anyhow::{Context, Result};
use std::path::Path;
use warden_config::{ConfigLoader, WardenConfig};

/// Load and validate a configuration file, reporting the result
pub fn validate(config_file: &Path) -> Result<()> {
    let config = ConfigLoader::new()
        .from_file(config_file)
        .with_context(|| format!("Configuration file {} is invalid", config_file.display()))?;

    println!("Configuration file {} is valid", config_file.display());
    println!(
        "  static cache: {}",
        if config.cache.static_cache.enabled { config.cache.static_cache.backend.as_str() } else { "disabled" }
    );
    println!(
        "  persistent cache: {}",
        if config.cache.persistent_cache.enabled {
            config.cache.persistent_cache.backend.as_str()
        } else {
            "disabled"
        }
    );
    println!("  log level: {}", config.logging.level.as_str());
    Ok(())
}

/// Write a sample configuration file
pub fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists, use --force to overwrite", output.display());
    }

    std::fs::write(output, WardenConfig::generate_sample())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Sample configuration written to {}", output.display());
    Ok(())
}

/// Render the configuration in use
pub fn show(config: &WardenConfig, format: &str) -> Result<String> {
    match format {
        "yaml" => Ok(serde_yaml::to_string(config)?),
        "json" => Ok(serde_json::to_string_pretty(config)?),
        other => anyhow::bail!("Unsupported format '{}', expected yaml or json", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.yaml");

        generate(&path, false).unwrap();
        assert!(generate(&path, false).is_err());
        generate(&path, true).unwrap();

        validate(&path).unwrap();
    }

    #[test]
    fn test_show_formats() {
        let config = WardenConfig::default();
        assert!(show(&config, "yaml").unwrap().contains("persistent_cache"));
        assert!(show(&config, "json").unwrap().contains("\"static_cache\""));
        assert!(show(&config, "toml").is_err());
    }
}
