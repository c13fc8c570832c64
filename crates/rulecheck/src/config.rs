//! Validator configuration and its environment loader

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_MODE: &str = "RULECHECK_MODE";
pub const ENV_URL_PREFIXES: &str = "RULECHECK_URL_PREFIXES";
pub const ENV_DNS_TIMEOUT_MS: &str = "RULECHECK_DNS_TIMEOUT_MS";
pub const ENV_ABSENT_FIELDS: &str = "RULECHECK_ABSENT_FIELDS";

pub const DEFAULT_URL_PREFIXES: [&str; 3] = ["http://", "https://", "ftp://"];
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': '{value}'. Expected: {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Configuration validation failed: {message}")]
    ValidationFailed { message: String },
}

/// How a validation run reports its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One message per failed rule
    #[default]
    Strict,
    /// A single pass/fail flag
    Boolean,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" | "messages" => Ok(Mode::Strict),
            "boolean" | "bool" => Ok(Mode::Boolean),
            _ => Err(ConfigError::InvalidValue {
                field: "mode".to_string(),
                value: s.to_string(),
                expected: "strict or boolean".to_string(),
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Mode::Strict => "strict",
            Mode::Boolean => "boolean",
        };
        write!(f, "{}", mode)
    }
}

/// Treatment of fields that have requirements but no input value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentFieldPolicy {
    /// Evaluate the field's rules against null, after the supplied inputs
    #[default]
    #[serde(rename = "null")]
    EvaluateAsNull,
    /// Only evaluate fields present in the inputs
    Skip,
}

impl FromStr for AbsentFieldPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "null" | "evaluate" => Ok(AbsentFieldPolicy::EvaluateAsNull),
            "skip" => Ok(AbsentFieldPolicy::Skip),
            _ => Err(ConfigError::InvalidValue {
                field: "absent_fields".to_string(),
                value: s.to_string(),
                expected: "null or skip".to_string(),
            }),
        }
    }
}

impl fmt::Display for AbsentFieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = match self {
            AbsentFieldPolicy::EvaluateAsNull => "null",
            AbsentFieldPolicy::Skip => "skip",
        };
        write!(f, "{}", policy)
    }
}

/// Settings shared by every run of a validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub mode: Mode,
    pub url_prefixes: Vec<String>,
    pub dns_timeout: Duration,
    pub absent_fields: AbsentFieldPolicy,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            url_prefixes: DEFAULT_URL_PREFIXES.iter().map(|p| p.to_string()).collect(),
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            absent_fields: AbsentFieldPolicy::default(),
        }
    }
}

impl ValidatorConfig {
    /// Defaults overridden by `RULECHECK_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(mode) = env::var(ENV_MODE) {
            config.mode = mode.parse()?;
        }

        if let Ok(prefixes) = env::var(ENV_URL_PREFIXES) {
            config.url_prefixes = prefixes
                .split(',')
                .map(str::trim)
                .filter(|prefix| !prefix.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(timeout) = env::var(ENV_DNS_TIMEOUT_MS) {
            let millis: u64 = timeout.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "dns_timeout".to_string(),
                value: timeout.clone(),
                expected: "a timeout in milliseconds".to_string(),
            })?;
            config.dns_timeout = Duration::from_millis(millis);
        }

        if let Ok(policy) = env::var(ENV_ABSENT_FIELDS) {
            config.absent_fields = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url_prefixes.is_empty() {
            return Err(ConfigError::ValidationFailed {
                message: "at least one URL prefix is required".to_string(),
            });
        }

        if self.dns_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "dns_timeout".to_string(),
                value: "0".to_string(),
                expected: "a timeout above zero".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [ENV_MODE, ENV_URL_PREFIXES, ENV_DNS_TIMEOUT_MS, ENV_ABSENT_FIELDS] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("strict".parse::<Mode>().unwrap(), Mode::Strict);
        assert_eq!("BOOLEAN".parse::<Mode>().unwrap(), Mode::Boolean);
        assert!("loud".parse::<Mode>().is_err());
        assert_eq!(Mode::Boolean.to_string(), "boolean");
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            "null".parse::<AbsentFieldPolicy>().unwrap(),
            AbsentFieldPolicy::EvaluateAsNull
        );
        assert_eq!("skip".parse::<AbsentFieldPolicy>().unwrap(), AbsentFieldPolicy::Skip);
        assert!("ignore".parse::<AbsentFieldPolicy>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ValidatorConfig::default();
        assert_eq!(config.mode, Mode::Strict);
        assert_eq!(config.url_prefixes, vec!["http://", "https://", "ftp://"]);
        assert_eq!(config.dns_timeout, Duration::from_secs(2));
        assert_eq!(config.absent_fields, AbsentFieldPolicy::EvaluateAsNull);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var(ENV_MODE, "boolean");
        env::set_var(ENV_URL_PREFIXES, "https://, git://");
        env::set_var(ENV_DNS_TIMEOUT_MS, "250");
        env::set_var(ENV_ABSENT_FIELDS, "skip");

        let config = ValidatorConfig::from_env().unwrap();
        assert_eq!(config.mode, Mode::Boolean);
        assert_eq!(config.url_prefixes, vec!["https://", "git://"]);
        assert_eq!(config.dns_timeout, Duration::from_millis(250));
        assert_eq!(config.absent_fields, AbsentFieldPolicy::Skip);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_values() {
        clear_env();
        env::set_var(ENV_DNS_TIMEOUT_MS, "soon");
        assert!(matches!(
            ValidatorConfig::from_env(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "dns_timeout"
        ));

        env::set_var(ENV_DNS_TIMEOUT_MS, "0");
        assert!(ValidatorConfig::from_env().is_err());

        clear_env();
        env::set_var(ENV_URL_PREFIXES, " , ");
        assert!(matches!(
            ValidatorConfig::from_env(),
            Err(ConfigError::ValidationFailed { .. })
        ));

        clear_env();
    }
}
