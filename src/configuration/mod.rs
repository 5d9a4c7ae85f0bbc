use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File read error")]
    FileError,

    #[error("Deserialization error:{0}")]
    DeserializationError(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bot_token: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub channels: Vec<ChannelConfig>,
    pub button_labels: ButtonLabels,
    pub messages: MessageTemplates,
    pub apps: Vec<AppItem>,
    pub admin_ids: Vec<i64>,
    #[serde(default)]
    pub features: FeatureFlags,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    pub name: String,
    pub link: String,
    pub chat_id: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ButtonLabels {
    pub back: String,
    pub next: String,
    pub check: String,
    pub help: String,
    pub generate: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessageTemplates {
    pub start: String,
    pub check_success: String,
    pub help: String,
    pub send_me_your_id: String,
    pub send_id_prompt: String,
    pub invalid_id: String,
    pub congratulation: String,
    pub code_prefix: String,
    pub cancelled: String,
    pub not_subscribed: String,
    pub welcome: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppItem {
    pub name: String,
    pub info: String,
    pub link: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FeatureFlags {
    #[serde(default)]
    pub auto_approve_channel_join: bool,
    // The observed build treated every user as subscribed; the gate stays
    // off unless this flag is set.
    #[serde(default)]
    pub enforce_membership_gate: bool,
}

fn default_database_path() -> String {
    "users.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
}

impl Context {
    pub fn new(config_file: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            config: Config::new(config_file)?,
        })
    }
}

impl Config {
    pub fn new(config_file: &str) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(config_file).map_err(|_| ConfigError::FileError)?;
        let config: Config = serde_json::from_str(&config_str)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;
        Ok(config)
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    pub fn find_app(&self, name: &str) -> Option<&AppItem> {
        self.apps.iter().find(|app| app.name == name)
    }
}
