//! Application configuration loaded from `config.toml` and the environment.
//!
//! The file is optional; every field has a default. A handful of environment
//! variables override the file so that deployments can keep secrets and
//! per-host tweaks in `.env`:
//!
//! - `LUNAR_CONFIG` – path of the TOML file (default `config.toml`)
//! - `PREFIX` – text command prefix
//! - `BOT_NAME` – console prompt name until the bot is logged in
//! - `TENOR_API_KEY` (or the older `TenorKey`) – Tenor API key
//!
//! The bot token is deliberately not part of [`AppConfig`]; `main` reads it
//! right before use.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Anti-raid settings consulted when members join.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AntiRaidConfig {
    /// Initial state of the anti-raid flag (the console can flip it)
    pub enabled: bool,
    /// Accounts younger than this are logged as possible alts
    pub min_account_age_days: i64,
}

impl Default for AntiRaidConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_account_age_days: 7,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Text command prefix
    pub prefix: String,
    /// Console prompt name used before the bot knows its own name
    pub bot_name: String,
    /// Users allowed to run owner-only commands
    pub owners: Vec<u64>,
    /// When set, slash commands are published to this guild instead of globally
    pub dev_guild_id: Option<u64>,
    /// Directory holding the JSON stores
    pub data_dir: PathBuf,
    /// Directory holding per-module settings (`<module>.toml`)
    pub cogs_dir: PathBuf,
    /// Link printed by the `link` command
    pub invite_link: String,
    /// Anti-raid settings
    pub antiraid: AntiRaidConfig,
    /// Tenor API key (environment only)
    #[serde(skip)]
    pub tenor_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prefix: "!!".to_string(),
            bot_name: "Bot".to_string(),
            owners: Vec::new(),
            dev_guild_id: None,
            data_dir: PathBuf::from("."),
            cogs_dir: PathBuf::from("cogs"),
            invite_link: "<YOUR_INVITE_LINK>".to_string(),
            antiraid: AntiRaidConfig::default(),
            tenor_api_key: None,
        }
    }
}

impl AppConfig {
    /// Path of a JSON store inside the data directory.
    #[must_use]
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Applies environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("PREFIX").filter(|p| !p.is_empty()) {
            self.prefix = prefix;
        }
        if let Some(name) = lookup("BOT_NAME").filter(|n| !n.is_empty()) {
            self.bot_name = name;
        }
        self.tenor_api_key = lookup("TENOR_API_KEY")
            .or_else(|| lookup("TenorKey"))
            .filter(|k| !k.is_empty());
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config: {e}"),
    })
}

/// Loads the configuration file at `path`; a missing file yields the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Attempting to load configuration from: {}", path.display());
    if !path.exists() {
        info!("{} not found, using default configuration", path.display());
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads the configuration the way the binary does: file then environment.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var("LUNAR_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = load_config(&path)?;
    config.apply_env(|key| std::env::var(key).ok());
    info!(
        prefix = %config.prefix,
        owners = config.owners.len(),
        tenor = config.tenor_api_key.is_some(),
        "Configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            prefix = "?"
            owners = [972357305226125322]
            dev_guild_id = 1442581624481910827
            data_dir = "data"

            [antiraid]
            enabled = false
            min_account_age_days = 3
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.prefix, "?");
        assert_eq!(config.owners, vec![972_357_305_226_125_322]);
        assert_eq!(config.dev_guild_id, Some(1_442_581_624_481_910_827));
        assert_eq!(config.data_file("x.json"), PathBuf::from("data").join("x.json"));
        assert!(!config.antiraid.enabled);
        assert_eq!(config.antiraid.min_account_age_days, 3);
        assert_eq!(config.cogs_dir, PathBuf::from("cogs"));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(parse_config("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(matches!(parse_config("prefix = 5"), Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = load_config("definitely/not/here.toml").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([("PREFIX", "$"), ("TenorKey", "legacy-key"), ("BOT_NAME", "")]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.prefix, "$");
        assert_eq!(config.bot_name, "Bot");
        assert_eq!(config.tenor_api_key.as_deref(), Some("legacy-key"));
    }
}
