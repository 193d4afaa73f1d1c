use anyhow::{Context, Result};
use greentic_lease_spec::Duration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const MAX_TTL_ENV: &str = "GREENTIC_LEASE_MAX_TTL_SECS";
const MAX_INTERNAL_DATA_ENV: &str = "GREENTIC_LEASE_MAX_INTERNAL_DATA_BYTES";

/// Limits the broker applies to descriptors before handing them over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// Ceiling for issued and renewed leases; longer leases are shortened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lease_secs: Option<u64>,
    /// Largest accepted JSON encoding of a descriptor's `internal_data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_internal_data_bytes: Option<usize>,
}

impl BrokerConfig {
    /// Read limits from the environment.
    ///
    /// * `GREENTIC_LEASE_MAX_TTL_SECS` caps lease durations (minimum 1s).
    /// * `GREENTIC_LEASE_MAX_INTERNAL_DATA_BYTES` caps the encoded payload size.
    ///
    /// Unset, empty or unparsable values leave the limit disabled.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(ttl) = std::env::var(MAX_TTL_ENV) {
            if let Ok(seconds) = ttl.trim().parse::<u64>() {
                config.max_lease_secs = Some(seconds.max(1));
            }
        }

        if let Ok(bytes) = std::env::var(MAX_INTERNAL_DATA_ENV) {
            if let Ok(limit) = bytes.trim().parse::<usize>() {
                config.max_internal_data_bytes = Some(limit);
            }
        }

        config
    }

    /// Load a TOML or JSON (by `.json` extension) config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = if path.extension().map(|ext| ext == "json").unwrap_or(false) {
            serde_json::from_str(&data)
                .with_context(|| format!("invalid json config {}", path.display()))?
        } else {
            toml::from_str(&data)
                .with_context(|| format!("invalid toml config {}", path.display()))?
        };
        if config.max_lease_secs == Some(0) {
            anyhow::bail!("max_lease_secs must be greater than zero in {}", path.display());
        }
        Ok(config)
    }

    /// Apply values set in `other` on top of `self`.
    pub fn merge(mut self, other: BrokerConfig) -> Self {
        if other.max_lease_secs.is_some() {
            self.max_lease_secs = other.max_lease_secs;
        }
        if other.max_internal_data_bytes.is_some() {
            self.max_internal_data_bytes = other.max_internal_data_bytes;
        }
        self
    }

    pub fn max_lease(&self) -> Option<Duration> {
        self.max_lease_secs
            .map(|secs| Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    fn clear_env() {
        unsafe {
            std::env::remove_var(MAX_TTL_ENV);
            std::env::remove_var(MAX_INTERNAL_DATA_ENV);
        }
    }

    #[test]
    #[serial]
    fn from_env_defaults_to_no_limits() {
        clear_env();
        assert_eq!(BrokerConfig::from_env(), BrokerConfig::default());
    }

    #[test]
    #[serial]
    fn from_env_reads_limits() {
        clear_env();
        unsafe {
            std::env::set_var(MAX_TTL_ENV, "0");
            std::env::set_var(MAX_INTERNAL_DATA_ENV, "4096");
        }
        let config = BrokerConfig::from_env();
        assert_eq!(config.max_lease_secs, Some(1));
        assert_eq!(config.max_internal_data_bytes, Some(4096));
        clear_env();
    }

    #[test]
    #[serial]
    fn from_env_ignores_garbage() {
        clear_env();
        unsafe {
            std::env::set_var(MAX_TTL_ENV, "soon");
        }
        assert_eq!(BrokerConfig::from_env().max_lease_secs, None);
        clear_env();
    }

    #[test]
    fn loads_toml_and_json() {
        let dir = tempdir().unwrap();
        let toml_path = dir.path().join("lease.toml");
        fs::write(&toml_path, "max_lease_secs = 3600\n").unwrap();
        let config = BrokerConfig::load_from_file(&toml_path).unwrap();
        assert_eq!(config.max_lease(), Some(Duration::hours(1)));

        let json_path = dir.path().join("lease.json");
        fs::write(&json_path, r#"{"max_internal_data_bytes": 512}"#).unwrap();
        let config = BrokerConfig::load_from_file(&json_path).unwrap();
        assert_eq!(config.max_internal_data_bytes, Some(512));
        assert_eq!(config.max_lease(), None);
    }

    #[test]
    fn rejects_zero_ceiling_and_unknown_keys() {
        let dir = tempdir().unwrap();
        let zero = dir.path().join("zero.toml");
        fs::write(&zero, "max_lease_secs = 0\n").unwrap();
        assert!(BrokerConfig::load_from_file(&zero).is_err());

        let typo = dir.path().join("typo.toml");
        fs::write(&typo, "max_lease = 10\n").unwrap();
        let err = BrokerConfig::load_from_file(&typo).unwrap_err();
        assert!(format!("{err:#}").contains("invalid toml config"));
    }

    #[test]
    fn merge_prefers_set_values() {
        let base = BrokerConfig {
            max_lease_secs: Some(60),
            max_internal_data_bytes: Some(10),
        };
        let merged = base.merge(BrokerConfig {
            max_lease_secs: Some(120),
            max_internal_data_bytes: None,
        });
        assert_eq!(merged.max_lease_secs, Some(120));
        assert_eq!(merged.max_internal_data_bytes, Some(10));
    }
}
