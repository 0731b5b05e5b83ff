use chrono::Duration;
use reqwest::Url;
use secrecy::Secret;
use serde::Deserialize;
use service_core::error::AppError;
use std::path::PathBuf;

use crate::models::TokenLifetimes;
use crate::pipeline::PACKAGE_PREFIX;

/// Settings shared by the `install` and `serve` commands.
///
/// Loaded from an optional `configuration.{yaml,toml,json}` file and `APP_*`
/// environment variables (`APP_PORT`, `APP_INSTALLER__PROGRAM`, ...). The
/// shared secret and billing identity come from `SHARED_FETCH_SECRET` and
/// `BILLING_EMAIL`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_registry_url")]
    pub registry_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_auth_host")]
    pub auth_host: String,
    #[serde(default = "default_package_prefix")]
    pub package_prefix: String,
    #[serde(default)]
    pub shared_fetch_secret: Option<Secret<String>>,
    #[serde(default)]
    pub billing_email: Option<String>,
    #[serde(default)]
    pub installer: InstallerSettings,
    #[serde(default)]
    pub tokens: TokenSettings,
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallerSettings {
    #[serde(default = "default_installer_program")]
    pub program: String,
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
}

impl Default for InstallerSettings {
    fn default() -> Self {
        Self {
            program: default_installer_program(),
            working_dir: default_working_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenSettings {
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: i64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
        }
    }
}

impl TokenSettings {
    pub fn lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access: Duration::seconds(self.access_ttl_secs),
            refresh: Duration::seconds(self.refresh_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub uri: String,
    #[serde(default = "default_database_name")]
    pub name: String,
}

fn default_registry_url() -> String {
    "https://registry.npmjs.org".to_string()
}

fn default_port() -> u16 {
    8084
}

fn default_auth_host() -> String {
    "localhost".to_string()
}

fn default_package_prefix() -> String {
    PACKAGE_PREFIX.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_installer_program() -> String {
    "npm".to_string()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_access_ttl() -> i64 {
    3600
}

fn default_refresh_ttl() -> i64 {
    30 * 24 * 3600
}

fn default_database_name() -> String {
    "addons".to_string()
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        service_core::config::load(
            "configuration",
            &[
                ("shared_fetch_secret", "SHARED_FETCH_SECRET"),
                ("billing_email", "BILLING_EMAIL"),
            ],
        )
    }

    /// Base URL of the authorization service listening on `port`.
    pub fn auth_base_url(&self, port: u16) -> Result<Url, AppError> {
        let raw = format!("http://{}:{}/", self.auth_host, port);
        Url::parse(&raw)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("invalid auth url {}: {}", raw, e)))
    }

    pub fn require_shared_secret(&self) -> Result<Secret<String>, AppError> {
        self.shared_fetch_secret
            .clone()
            .ok_or_else(|| AppError::ConfigError(anyhow::anyhow!("SHARED_FETCH_SECRET is not set")))
    }

    pub fn require_billing_email(&self) -> Result<String, AppError> {
        self.billing_email
            .clone()
            .filter(|email| !email.is_empty())
            .ok_or_else(|| AppError::ConfigError(anyhow::anyhow!("BILLING_EMAIL is not set")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn from_json(value: serde_json::Value) -> Settings {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = from_json(serde_json::json!({}));
        assert_eq!(settings.registry_url, "https://registry.npmjs.org");
        assert_eq!(settings.port, 8084);
        assert_eq!(settings.package_prefix, "npm-addon-");
        assert_eq!(settings.installer.program, "npm");
        assert!(settings.database.is_none());
        assert_eq!(settings.tokens.lifetimes().access, Duration::hours(1));
    }

    #[test]
    fn test_auth_base_url_uses_port() {
        let settings = from_json(serde_json::json!({}));
        assert_eq!(
            settings.auth_base_url(9000).unwrap().as_str(),
            "http://localhost:9000/"
        );
    }

    #[test]
    fn test_required_values() {
        let settings = from_json(serde_json::json!({
            "shared_fetch_secret": "s3cret",
            "billing_email": ""
        }));
        assert_eq!(settings.require_shared_secret().unwrap().expose_secret(), "s3cret");
        assert!(settings.require_billing_email().is_err());
    }
}
