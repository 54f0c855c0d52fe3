//! Configuration management

use crate::error::{ErrorContext, PinegateError, PinegateResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinegateConfig {
    pub platform: PlatformConfig,
    pub credentials: CredentialsConfig,
}

/// Remote platform connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the remote platform
    pub base_url: String,
    /// Request timeout in seconds, applied once on the shared HTTP client
    pub timeout_seconds: u64,
    /// User agent string for authenticated data calls
    pub user_agent: String,
}

/// Privileged account credentials used for login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

impl Default for PinegateConfig {
    fn default() -> Self {
        Self {
            platform: PlatformConfig {
                base_url: "https://www.tradingview.com".to_string(),
                timeout_seconds: 30,
                user_agent: "pinegate/0.1".to_string(),
            },
            credentials: CredentialsConfig {
                username: String::new(),
                password: String::new(),
            },
        }
    }
}

impl PinegateConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> PinegateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PinegateError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("read_file"),
        })?;

        let config: PinegateConfig =
            toml::from_str(&content).map_err(|e| PinegateError::Config {
                message: format!("Failed to parse config: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config").with_operation("parse_toml"),
            })?;

        Ok(config)
    }

    /// Load configuration from environment variables, falling back to
    /// defaults for platform settings. Credentials come from TV_USERNAME
    /// and TV_PASSWORD.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            platform: PlatformConfig {
                base_url: std::env::var("PINEGATE_BASE_URL")
                    .unwrap_or(defaults.platform.base_url),
                timeout_seconds: std::env::var("PINEGATE_TIMEOUT_SECONDS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.platform.timeout_seconds),
                user_agent: std::env::var("PINEGATE_USER_AGENT")
                    .unwrap_or(defaults.platform.user_agent),
            },
            credentials: CredentialsConfig {
                username: std::env::var("TV_USERNAME").unwrap_or_default(),
                password: std::env::var("TV_PASSWORD").unwrap_or_default(),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> PinegateResult<()> {
        if self.platform.base_url.is_empty() {
            return Err(PinegateError::Config {
                message: "Platform base URL must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        if self.credentials.username.is_empty() || self.credentials.password.is_empty() {
            return Err(PinegateError::Config {
                message: "Account credentials are not configured".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        if self.platform.timeout_seconds == 0 {
            return Err(PinegateError::Config {
                message: "Request timeout must be greater than zero".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_points_at_platform() {
        let config = PinegateConfig::default();
        assert_eq!(config.platform.base_url, "https://www.tradingview.com");
        assert_eq!(config.platform.timeout_seconds, 30);
    }

    #[test]
    fn test_validate_rejects_missing_credentials() {
        let config = PinegateConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let mut config = PinegateConfig::default();
        config.credentials.username = "owner".to_string();
        config.credentials.password = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pinegate.toml");
        std::fs::write(
            &path,
            r#"
[platform]
base_url = "http://localhost:9999"
timeout_seconds = 5
user_agent = "pinegate-test"

[credentials]
username = "owner"
password = "secret"
"#,
        )
        .unwrap();

        let config = PinegateConfig::from_file(&path).unwrap();
        assert_eq!(config.platform.base_url, "http://localhost:9999");
        assert_eq!(config.platform.timeout_seconds, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip_through_toml() {
        let mut config = PinegateConfig::default();
        config.credentials.username = "owner".to_string();
        config.credentials.password = "secret".to_string();

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: PinegateConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.platform.base_url, config.platform.base_url);
        assert_eq!(parsed.credentials.username, "owner");
    }
}
