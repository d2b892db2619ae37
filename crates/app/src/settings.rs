//! Application settings, read from an optional `settings.toml` and from
//! `HIREPURCHASE__*` environment variables (e.g. `HIREPURCHASE__SERVER__PORT`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Engine {
    #[serde(default = "default_trial_days")]
    pub trial_days: i64,
    #[serde(default = "default_after_days")]
    pub default_after_days: i64,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
            default_after_days: default_after_days(),
        }
    }
}

fn default_trial_days() -> i64 {
    engine::DEFAULT_TRIAL_DAYS
}

fn default_after_days() -> i64 {
    engine::DEFAULT_AFTER_DAYS
}

/// Periodic status sweep. `interval_secs = 0` disables it.
#[derive(Debug, Deserialize)]
pub struct Maintenance {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for Maintenance {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub engine: Engine,
    #[serde(default)]
    pub maintenance: Maintenance,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("HIREPURCHASE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
