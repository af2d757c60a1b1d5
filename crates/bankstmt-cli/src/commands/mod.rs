//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::Path;

use bankstmt_core::StatementConfig;

/// Load the config named by `--config`, else the user config file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<StatementConfig> {
    if let Some(path) = config_path {
        return Ok(StatementConfig::from_file(Path::new(path))?);
    }

    let user_config = config::default_config_path();
    if user_config.exists() {
        return Ok(StatementConfig::from_file(&user_config)?);
    }

    Ok(StatementConfig::default())
}
