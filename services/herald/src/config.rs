//! Configuration types for the herald service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Reject settings no delivery could succeed with
    pub fn validate(&self) -> crate::Result<()> {
        if self.notifications.request_timeout_seconds == 0 {
            return Err(crate::HeraldError::Config(
                "request_timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A webhook endpoint and the payloads sent to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub name: String,
    /// Validated when a notification is delivered, not when the config is loaded
    #[serde(default)]
    pub endpoint_uri: Option<String>,
    #[serde(default)]
    pub failure_payload_template: String,
    #[serde(default)]
    pub recovery_payload_template: String,
}

impl WebhookConfig {
    /// Template for the given target state
    pub fn template_for(&self, is_healthy: bool) -> &str {
        if is_healthy {
            &self.recovery_payload_template
        } else {
            &self.failure_payload_template
        }
    }
}

/// Cooldown and delivery settings shared by all webhooks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Zero or negative disables suppression
    #[serde(default = "default_cooldown_seconds")]
    pub min_seconds_between_repeat_notifications: i64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            min_seconds_between_repeat_notifications: default_cooldown_seconds(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Ledger storage. Without a path records are kept in memory only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Transition ingress server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_server_port(),
        }
    }
}

fn default_cooldown_seconds() -> i64 {
    300
}

fn default_request_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_server_port() -> u16 {
    11120
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::HeraldError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
