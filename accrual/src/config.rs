//! Ledger configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use drip_types::{Identity, RewardAmount, Timestamp};

use crate::LedgerError;

/// Configuration for a reward ledger.
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Reward per second per active position, as a decimal string of whole units.
    #[serde(default = "default_initial_rate")]
    pub initial_rate: String,

    /// Unix seconds from which the initial rate is in force.
    #[serde(default)]
    pub genesis: u64,

    /// The only identity allowed to change the rate or withdraw the reserve.
    #[serde(default = "default_authority")]
    pub authority: String,

    /// Whether leaving also pays out whatever the reserve allows.
    #[serde(default)]
    pub claim_on_leave: bool,

    /// Upper bound on ids in one batch call.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

/// 50 units per day.
fn default_initial_rate() -> String {
    "0.000578703703703703".to_string()
}

fn default_authority() -> String {
    "authority".to_string()
}

fn default_max_batch_size() -> usize {
    500
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl LedgerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, LedgerError> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        self.initial_rate()?;
        if self.max_batch_size == 0 {
            return Err(LedgerError::Config("max_batch_size must be at least 1".into()));
        }
        if self.authority.is_empty() {
            return Err(LedgerError::Config("authority must not be empty".into()));
        }
        Ok(())
    }

    pub fn initial_rate(&self) -> Result<RewardAmount, LedgerError> {
        RewardAmount::from_decimal_str(&self.initial_rate)
            .map_err(|e| LedgerError::Config(format!("initial_rate: {e}")))
    }

    pub fn genesis(&self) -> Timestamp {
        Timestamp::new(self.genesis)
    }

    pub fn authority(&self) -> Identity {
        Identity::new(self.authority.clone())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_rate: default_initial_rate(),
            genesis: 0,
            authority: default_authority(),
            claim_on_leave: false,
            max_batch_size: default_max_batch_size(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = LedgerConfig::from_toml_str("").unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.initial_rate().unwrap().raw(), 578_703_703_703_703);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = LedgerConfig::from_toml_str(
            r#"
            initial_rate = "1.5"
            claim_on_leave = true
            max_batch_size = 10
            "#,
        )
        .unwrap();
        assert_eq!(
            config.initial_rate().unwrap(),
            RewardAmount::new(1_500_000_000_000_000_000)
        );
        assert!(config.claim_on_leave);
        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.authority, "authority");
    }

    #[test]
    fn invalid_rate_is_a_config_error() {
        let err = LedgerConfig::from_toml_str(r#"initial_rate = "fast""#).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = LedgerConfig::from_toml_str("max_batch_size = 0").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn toml_string_roundtrips_through_a_file() {
        let mut config = LedgerConfig::default();
        config.genesis = 1_700_000_000;
        config.authority = "ops".into();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_toml_string().unwrap().as_bytes())
            .unwrap();

        let loaded = LedgerConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.genesis(), Timestamp::new(1_700_000_000));
        assert_eq!(loaded.authority(), Identity::new("ops"));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = LedgerConfig::from_toml_file("/nonexistent/drip.toml").unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
