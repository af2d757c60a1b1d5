//! Config command - manage the statement extraction configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use bankstmt_core::StatementConfig;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show built-in defaults, ignoring any config file
        #[arg(long)]
        defaults: bool,
    },

    /// Write a configuration file with default values
    Init {
        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print one value (e.g. "extraction.date_order")
    Get { key: String },

    /// Change one value; JSON literals are parsed, anything else is a string
    Set { key: String, value: String },

    /// Show configuration file path
    Path,
}

/// `<config dir>/bankstmt/config.json`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bankstmt")
        .join("config.json")
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path.map(PathBuf::from).unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show { defaults } => {
            let config = if defaults { StatementConfig::default() } else { load_or_default(&path)? };
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommand::Init { force } => init_config(&path, force)?,
        ConfigCommand::Get { key } => {
            let json = serde_json::to_value(load_or_default(&path)?)?;
            let value = lookup(&json, &key).ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        ConfigCommand::Set { key, value } => set_config(&path, &key, &value)?,
        ConfigCommand::Path => {
            println!("Configuration file: {}", path.display());
            if path.exists() {
                println!("Status: {}", style("exists").green());
            } else {
                println!("Status: {}", style("not created").yellow());
                println!();
                println!("Run 'bankstmt config init' to create a configuration file.");
            }
        }
    }

    Ok(())
}

fn load_or_default(path: &Path) -> anyhow::Result<StatementConfig> {
    if path.exists() {
        Ok(StatementConfig::from_file(path)?)
    } else {
        Ok(StatementConfig::default())
    }
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    StatementConfig::default().save(path)?;

    eprintln!(
        "{} Created configuration file at {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}

fn set_config(path: &Path, key: &str, raw: &str) -> anyhow::Result<()> {
    let value: Value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));

    let mut json = serde_json::to_value(load_or_default(path)?)?;
    assign(&mut json, key, value.clone())?;

    // Round-trip through the typed config so bad values never reach disk
    let config: StatementConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;

    eprintln!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

fn lookup<'a>(json: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(json, |current, part| current.get(part))
}

/// Replace an existing leaf. Unknown keys are rejected rather than added.
fn assign(json: &mut Value, key: &str, value: Value) -> anyhow::Result<()> {
    let (parent_key, leaf) = match key.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, key),
    };

    let parent = match parent_key {
        Some(parent_key) => parent_key
            .split('.')
            .try_fold(&mut *json, |current, part| current.get_mut(part)),
        None => Some(&mut *json),
    };

    let object = parent
        .and_then(Value::as_object_mut)
        .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;

    // Map-valued sections (extra column patterns) accept new keys
    if !object.contains_key(leaf) && parent_key != Some("extraction.extra_column_patterns") {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    object.insert(leaf.to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup() {
        let json = serde_json::to_value(StatementConfig::default()).unwrap();
        assert_eq!(lookup(&json, "extraction.header_scan_rows"), Some(&json!(5)));
        assert_eq!(lookup(&json, "extraction.nope"), None);
    }

    #[test]
    fn test_assign_existing_and_unknown() {
        let mut json = serde_json::to_value(StatementConfig::default()).unwrap();
        assign(&mut json, "pipeline.enable_ocr_llm", json!(false)).unwrap();
        assert_eq!(lookup(&json, "pipeline.enable_ocr_llm"), Some(&json!(false)));

        assert!(assign(&mut json, "pipeline.typo", json!(true)).is_err());
        assert!(assign(&mut json, "missing.section", json!(1)).is_err());

        assign(&mut json, "extraction.extra_column_patterns.debit", json!(["paid out"])).unwrap();
        let config: StatementConfig = serde_json::from_value(json).unwrap();
        assert!(!config.pipeline.enable_ocr_llm);
        assert_eq!(config.extraction.extra_column_patterns.len(), 1);
    }
}
