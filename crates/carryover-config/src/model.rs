use std::path::PathBuf;

use carryover_domain::{CycleType, UnknownCycleType};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable overriding the default data directory.
pub const DATA_ROOT_ENV: &str = "CARRYOVER_HOME";

/// Engine preferences and defaults applied to new budgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Display currency. Amounts are never converted.
    pub currency: String,
    #[serde(default = "Config::default_cycle_value")]
    pub default_cycle: String,
    #[serde(default = "Config::default_cycle_start_day_value")]
    pub default_cycle_start_day: u32,
    #[serde(default)]
    pub default_rollover: bool,
    #[serde(default = "Config::default_log_filter_value")]
    pub log_filter: String,
    #[serde(default = "Config::default_backup_retention_value")]
    pub backup_retention: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for budget data. Defaults to `~/.carryover`.
    pub data_root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for data backups. Defaults to `<data_root>/backups`.
    pub backup_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            default_cycle: Self::default_cycle_value(),
            default_cycle_start_day: Self::default_cycle_start_day_value(),
            default_rollover: false,
            log_filter: Self::default_log_filter_value(),
            backup_retention: Self::default_backup_retention_value(),
            data_root: None,
            backup_root: None,
        }
    }
}

impl Config {
    pub fn default_cycle_value() -> String {
        "month".into()
    }

    pub fn default_cycle_start_day_value() -> u32 {
        1
    }

    pub fn default_log_filter_value() -> String {
        "carryover=info".into()
    }

    pub fn default_backup_retention_value() -> usize {
        5
    }

    /// Parses `default_cycle`. An unknown name is an error, never a silent fallback.
    pub fn cycle_type(&self) -> Result<CycleType, UnknownCycleType> {
        self.default_cycle.parse()
    }

    /// Checks the values that cannot be expressed in the serialized types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cycle = self
            .cycle_type()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        if let Some((min, max)) = cycle.start_day_range() {
            if !(min..=max).contains(&self.default_cycle_start_day) {
                return Err(ConfigError::Invalid(format!(
                    "default_cycle_start_day {} is outside {}..={} for {} cycles",
                    self.default_cycle_start_day, min, max, cycle
                )));
            }
        }
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency cannot be empty".into()));
        }
        if self.backup_retention == 0 {
            return Err(ConfigError::Invalid(
                "backup_retention must keep at least one backup".into(),
            ));
        }
        Ok(())
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }
        if let Some(path) = std::env::var_os(DATA_ROOT_ENV).filter(|value| !value.is_empty()) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".carryover")
    }

    pub fn resolve_backup_root(&self) -> PathBuf {
        if let Some(path) = &self.backup_root {
            return path.clone();
        }
        self.resolve_data_root().join("backups")
    }
}
