//! Process configuration, read from environment variables.
//!
//! Values are read through a lookup function so tests can supply their own
//! environment without touching the process one.

use core::str::FromStr;
use std::net::SocketAddr;

use thiserror::Error;

use laundry_observability::{LogFormat, ParseLogFormatError};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5002";
pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_COMMIT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LAUNDRY_BIND_ADDR is not a socket address: {0:?}")]
    InvalidBindAddr(String),

    #[error("LAUNDRY_ENV must be \"production\" or \"development\", got {0:?}")]
    InvalidEnvironment(String),

    #[error("LAUNDRY_COMMIT_ATTEMPTS must be a positive integer, got {0:?}")]
    InvalidCommitAttempts(String),

    #[error("LOG_FORMAT: {0}")]
    InvalidLogFormat(#[from] ParseLogFormatError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub environment: Environment,
    pub commit_attempts: u32,
    pub log_format: LogFormat,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = match var("LAUNDRY_BIND_ADDR") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(raw))?,
            None => SocketAddr::from(([0, 0, 0, 0], 5002)),
        };

        let environment = match var("LAUNDRY_ENV") {
            Some(raw) => raw.parse()?,
            None => Environment::default(),
        };

        let commit_attempts = match var("LAUNDRY_COMMIT_ATTEMPTS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(ConfigError::InvalidCommitAttempts(raw)),
            },
            None => DEFAULT_COMMIT_ATTEMPTS,
        };

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            jwt_secret: var("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            database_url: var("DATABASE_URL"),
            environment,
            commit_attempts,
            log_format,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Whether 500 responses may carry the underlying error text.
    pub fn expose_internal_errors(&self) -> bool {
        self.environment == Environment::Development
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(cfg.uses_dev_secret());
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.environment, Environment::Production);
        assert_eq!(cfg.commit_attempts, DEFAULT_COMMIT_ATTEMPTS);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(!cfg.expose_internal_errors());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = config(&[
            ("LAUNDRY_BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "shh"),
            ("DATABASE_URL", "postgres://localhost/laundry"),
            ("LAUNDRY_ENV", "development"),
            ("LAUNDRY_COMMIT_ATTEMPTS", "5"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.jwt_secret, "shh");
        assert!(!cfg.uses_dev_secret());
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/laundry"));
        assert!(cfg.expose_internal_errors());
        assert_eq!(cfg.commit_attempts, 5);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[("DATABASE_URL", "  "), ("JWT_SECRET", "")]).unwrap();
        assert_eq!(cfg.database_url, None);
        assert!(cfg.uses_dev_secret());
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_eq!(
            config(&[("LAUNDRY_COMMIT_ATTEMPTS", "0")]),
            Err(ConfigError::InvalidCommitAttempts("0".into()))
        );
        assert!(matches!(
            config(&[("LAUNDRY_BIND_ADDR", "nowhere")]),
            Err(ConfigError::InvalidBindAddr(_))
        ));
        assert!(matches!(
            config(&[("LAUNDRY_ENV", "staging")]),
            Err(ConfigError::InvalidEnvironment(_))
        ));
        assert!(matches!(
            config(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }
}
