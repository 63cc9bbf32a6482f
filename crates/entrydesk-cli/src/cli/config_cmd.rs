use super::ConfigCommands;
use crate::config::DeskConfig;
use anyhow::Result;
use std::path::Path;

pub fn run(cmd: ConfigCommands, config_path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Validate => validate(config_path),
        ConfigCommands::Show => show(config_path),
    }
}

fn validate(config_path: &Path) -> Result<()> {
    let config = DeskConfig::load(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", config_path.display(), e))?;

    let errors = config.validate();
    if errors.is_empty() {
        println!("✅ {} is valid.", config_path.display());
        return Ok(());
    }

    println!("❌ Validation errors in {}:", config_path.display());
    for e in &errors {
        println!("  - {}", e);
    }
    anyhow::bail!("{} has {} error(s)", config_path.display(), errors.len())
}

fn show(config_path: &Path) -> Result<()> {
    let config = DeskConfig::load_or_default(config_path);
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
