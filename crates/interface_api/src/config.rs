//! API configuration
//!
//! Values come from `API_*` environment variables (a `.env` file is loaded by
//! the binary first). Without `API_DATABASE_URL` the server keeps guests in
//! memory only.

use serde::Deserialize;

use core_kernel::CoreError;
use domain_guest::{CompanionRemovalPolicy, GuestServiceConfig};

/// API configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL URL; `None` selects the in-memory store
    #[serde(default)]
    pub database_url: Option<String>,
    /// Maximum pooled database connections
    pub max_connections: u32,
    /// Log filter directive (trace, debug, info, warn, error)
    pub log_level: String,
    /// What happens to companions when their primary guest is removed
    pub companion_removal_policy: CompanionRemovalPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            max_connections: 10,
            log_level: "info".to_string(),
            companion_removal_policy: CompanionRemovalPolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_*` environment variables over the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("max_connections", i64::from(defaults.max_connections))?
            .set_default("log_level", defaults.log_level)?
            .set_default(
                "companion_removal_policy",
                defaults.companion_removal_policy.as_str(),
            )?
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Loads and validates the configuration
    pub fn load() -> Result<Self, CoreError> {
        let config = Self::from_env().map_err(|e| CoreError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system cannot
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::invalid_value("host", "cannot be empty"));
        }
        if self.max_connections == 0 {
            return Err(CoreError::invalid_value("max_connections", "must be at least 1"));
        }
        if let Some(url) = &self.database_url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(CoreError::invalid_value(
                    "database_url",
                    "must be a postgres:// or postgresql:// URL",
                ));
            }
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings handed to the guest service
    pub fn service_config(&self) -> GuestServiceConfig {
        GuestServiceConfig {
            removal_policy: self.companion_removal_policy,
        }
    }
}
