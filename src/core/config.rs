//! # Configuration
//!
//! YAML configuration with environment overrides.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::transport::UserId;

pub const DEFAULT_CONFIG_PATH: &str = "roombot.yaml";
pub const DEFAULT_PREFIX: &str = ">>";

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_startup_message() -> Option<String> {
    Some("Bot started.".to_string())
}

fn default_data_dir() -> String {
    "bot_data".to_string()
}

fn default_relay_socket() -> String {
    "/tmp/roombot-relay.sock".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Per-site user ids, e.g. `{ "stackoverflow.com": 12345, "meta.stackexchange.com": 678 }`
pub type SiteIds = HashMap<String, u64>;

/// Settings shared across sites
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub owners: Vec<SiteIds>,

    #[serde(default)]
    pub privileged_users: Vec<SiteIds>,

    pub owner_name: Option<String>,

    pub chatbot_name: Option<String>,

    /// Login email; prompted for when absent
    pub email: Option<String>,

    /// Login password; prompted for when absent
    pub password: Option<String>,

    /// Shown by the `about` command
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub general: GeneralConfig,

    /// Chat site host, e.g. `stackoverflow.com`; prompted for when absent
    #[serde(default)]
    pub site: Option<String>,

    /// Room number; prompted for when absent
    #[serde(default)]
    pub room: Option<u64>,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Posted after joining; `null` posts nothing
    #[serde(default = "default_startup_message")]
    pub startup_message: Option<String>,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_relay_socket")]
    pub relay_socket: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Owner and privileged-user ids for one site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identities {
    pub owners: HashSet<UserId>,
    pub privileged_users: HashSet<UserId>,
}

impl Config {
    /// Load from a YAML file, apply environment overrides, and validate
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        let mut config = Self::parse(&contents)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without touching the environment
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents).context("Invalid config")?;
        Ok(config)
    }

    /// Override settings from `ROOMBOT_*` / `LOG_LEVEL` variables
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = lookup("ROOMBOT_EMAIL") {
            self.general.email = Some(email);
        }
        if let Some(password) = lookup("ROOMBOT_PASSWORD") {
            self.general.password = Some(password);
        }
        if let Some(site) = lookup("ROOMBOT_SITE") {
            self.site = Some(site);
        }
        if let Some(room) = lookup("ROOMBOT_ROOM").and_then(|r| r.parse().ok()) {
            self.room = Some(room);
        }
        if let Some(prefix) = lookup("ROOMBOT_PREFIX") {
            self.prefix = prefix;
        }
        if let Some(socket) = lookup("ROOMBOT_RELAY_SOCKET") {
            self.relay_socket = socket;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
    }

    /// Settings without which the bot must not start
    pub fn validate(&self) -> Result<()> {
        if self.general.owners.is_empty() {
            bail!("no owners found. Please update the config file.");
        }
        if self.general.owner_name.as_deref().unwrap_or("").is_empty() {
            bail!("no owner name found. Please update the config file.");
        }
        if self.general.chatbot_name.as_deref().unwrap_or("").is_empty() {
            bail!("no chatbot name found. Please update the config file.");
        }
        if self.prefix.trim().is_empty() {
            bail!("the command prefix must not be blank");
        }
        Ok(())
    }

    /// Owner and privileged ids configured for `site`
    ///
    /// Fails when no owner has an id on that site.
    pub fn identities(&self, site: &str) -> Result<Identities> {
        let pick = |entries: &[SiteIds]| -> HashSet<UserId> {
            entries
                .iter()
                .filter_map(|ids| ids.get(site))
                .map(|&id| UserId(id))
                .collect()
        };

        let identities = Identities {
            owners: pick(&self.general.owners),
            privileged_users: pick(&self.general.privileged_users),
        };
        if identities.owners.is_empty() {
            bail!("no owners found for this site: {site}.");
        }
        Ok(identities)
    }
}
