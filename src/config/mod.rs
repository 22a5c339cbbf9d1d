#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::http::Endpoints;
use crate::core::ConfigProvider;
use crate::domain::model::{DEFAULT_NOTIFICATION_TTL, DEFAULT_SUCCESS_REVERT};
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use std::time::Duration;
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "venta-cart")]
#[command(about = "Cart client for the online bookstore")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "Store base URL [default: http://127.0.0.1:8000]")]
    pub base_url: Option<String>,

    #[arg(long, help = "CSRF token; read from the cart page when omitted")]
    pub csrf_token: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: cli::Command,
}

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Values the client runs with, after merging file and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub base_url: String,
    pub csrf_token: Option<String>,
    pub endpoints: Endpoints,
    pub notification_ttl: Duration,
    pub success_revert: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            csrf_token: None,
            endpoints: Endpoints::default(),
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
            success_revert: DEFAULT_SUCCESS_REVERT,
        }
    }
}

impl ClientSettings {
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            csrf_token: config.csrf_token().map(str::to_string),
            endpoints: config.endpoints(),
            notification_ttl: config.notification_ttl(),
            success_revert: config.success_revert(),
        }
    }

    /// Flags win over file values.
    pub fn with_overrides(mut self, base_url: Option<&str>, csrf_token: Option<&str>) -> Self {
        if let Some(base_url) = base_url {
            self.base_url = base_url.to_string();
        }
        if let Some(token) = csrf_token {
            self.csrf_token = Some(token.to_string());
        }
        self
    }
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn resolve(&self) -> Result<ClientSettings> {
        let base = match &self.config {
            Some(path) => {
                let file = TomlConfig::from_file(path)?;
                file.validate()?;
                ClientSettings::from_toml(&file)
            }
            None => ClientSettings::default(),
        };
        let settings =
            base.with_overrides(self.base_url.as_deref(), self.csrf_token.as_deref());
        settings.validate()?;
        Ok(settings)
    }
}

impl ConfigProvider for ClientSettings {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    fn notification_ttl(&self) -> Duration {
        self.notification_ttl
    }

    fn success_revert(&self) -> Duration {
        self.success_revert
    }
}

impl Validate for ClientSettings {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_positive_number(
            "notification_ttl",
            self.notification_ttl.as_millis() as u64,
            1,
        )?;
        Ok(())
    }
}
