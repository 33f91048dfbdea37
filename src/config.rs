// src/config.rs
// Runtime settings read from the environment (after dotenvy has loaded .env).

use crate::services::tls_parser::{TlsVersion, VERSION_TLS10, VERSION_TLS12};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub bind_addr: String,
    pub default_port: u16,
    pub timeout: Duration,
    pub min_version: u16,
    pub max_version: u16,
    pub max_concurrency: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            bind_addr: "127.0.0.1:8080".to_string(),
            default_port: 443,
            timeout: Duration::from_secs(10),
            min_version: VERSION_TLS10,
            max_version: VERSION_TLS12,
            max_concurrency: 16,
        }
    }
}

impl ProbeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ProbeConfig::default();

        if let Some(addr) = lookup("PROBE_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(raw) = lookup("PROBE_DEFAULT_PORT") {
            config.default_port = parse_number("PROBE_DEFAULT_PORT", &raw)?;
        }
        if let Some(raw) = lookup("PROBE_TIMEOUT_SECS") {
            let secs: u64 = parse_number("PROBE_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
                return Err(invalid("PROBE_TIMEOUT_SECS", raw, "must be positive"));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("PROBE_MIN_VERSION") {
            config.min_version = parse_version("PROBE_MIN_VERSION", raw)?;
        }
        if let Some(raw) = lookup("PROBE_MAX_VERSION") {
            config.max_version = parse_version("PROBE_MAX_VERSION", raw)?;
        }
        if let Some(raw) = lookup("PROBE_CONCURRENCY") {
            let n: usize = parse_number("PROBE_CONCURRENCY", &raw)?;
            if n == 0 {
                return Err(invalid("PROBE_CONCURRENCY", raw, "must be positive"));
            }
            config.max_concurrency = n;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: String, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { key, value, reason }
}

fn parse_number<N: std::str::FromStr>(key: &'static str, raw: &str) -> Result<N, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(key, raw.to_string(), "not a number"))
}

fn parse_version(key: &'static str, raw: String) -> Result<u16, ConfigError> {
    TlsVersion::parse_name(&raw)
        .map(|v| v.as_u16())
        .ok_or_else(|| invalid(key, raw, "expected one of 1.0, 1.1, 1.2, 1.3"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tls_parser::{VERSION_TLS11, VERSION_TLS13};
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ProbeConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProbeConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(config_from(&[]).unwrap(), ProbeConfig::default());
    }

    #[test]
    fn reads_all_keys() {
        let config = config_from(&[
            ("PROBE_BIND_ADDR", "0.0.0.0:9000"),
            ("PROBE_DEFAULT_PORT", "8443"),
            ("PROBE_TIMEOUT_SECS", "3"),
            ("PROBE_MIN_VERSION", "1.1"),
            ("PROBE_MAX_VERSION", "TLSv1.3"),
            ("PROBE_CONCURRENCY", "4"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.default_port, 8443);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.min_version, VERSION_TLS11);
        assert_eq!(config.max_version, VERSION_TLS13);
        assert_eq!(config.max_concurrency, 4);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_from(&[("PROBE_DEFAULT_PORT", "https")]).is_err());
        assert!(config_from(&[("PROBE_TIMEOUT_SECS", "0")]).is_err());
        assert!(config_from(&[("PROBE_CONCURRENCY", "0")]).is_err());
        let err = config_from(&[("PROBE_MAX_VERSION", "ssl3")]).unwrap_err();
        assert!(err.to_string().starts_with("PROBE_MAX_VERSION"));
    }
}
