/// Server configuration
///
/// Resolved once at startup: built-in defaults, then the TOML file
/// (~/.config/host-health/config.toml unless `--config` is given), then
/// `HOST_HEALTH_*` environment variables. CLI flags are applied last by the
/// caller.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::health::Thresholds;
use crate::utils::constants::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub cors: bool,
    pub disk_device: String,
    pub tmp_path: String,
    pub watched_port: u16,
    /// Bound on one collection. `/threads` runs two commands and both
    /// share this budget.
    #[serde(with = "duration_str")]
    pub command_timeout: Duration,
    pub log_level: String,
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub percent_ok: f64,
    pub percent_warn: f64,
    pub threads_ok: f64,
    pub threads_warn: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors: false,
            disk_device: DEFAULT_DISK_DEVICE.to_string(),
            tmp_path: DEFAULT_TMP_PATH.to_string(),
            watched_port: DEFAULT_WATCHED_PORT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            percent_ok: PERCENT_OK_CEILING,
            percent_warn: PERCENT_WARN_CEILING,
            threads_ok: THREADS_OK_CEILING,
            threads_warn: THREADS_WARN_CEILING,
        }
    }
}

impl ThresholdConfig {
    pub fn percent(&self) -> Thresholds {
        Thresholds::new(self.percent_ok, self.percent_warn)
    }

    pub fn threads(&self) -> Thresholds {
        Thresholds::new(self.threads_ok, self.threads_warn)
    }
}

impl Config {
    /// Default config file location, if a config dir exists for this user
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load defaults, the config file and environment overrides
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply `HOST_HEALTH_*` overrides through the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("HOST") {
            self.host = v;
        }
        if let Some(v) = var("PORT") {
            self.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = var("CORS") {
            self.cors = parse_env("CORS", &v)?;
        }
        if let Some(v) = var("DISK_DEVICE") {
            self.disk_device = v;
        }
        if let Some(v) = var("TMP_PATH") {
            self.tmp_path = v;
        }
        if let Some(v) = var("WATCHED_PORT") {
            self.watched_port = parse_env("WATCHED_PORT", &v)?;
        }
        if let Some(v) = var("COMMAND_TIMEOUT") {
            self.command_timeout = humantime::parse_duration(&v)
                .with_context(|| format!("Invalid {}COMMAND_TIMEOUT '{}'", ENV_PREFIX, v))?;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = var("PERCENT_OK") {
            self.thresholds.percent_ok = parse_env("PERCENT_OK", &v)?;
        }
        if let Some(v) = var("PERCENT_WARN") {
            self.thresholds.percent_warn = parse_env("PERCENT_WARN", &v)?;
        }
        if let Some(v) = var("THREADS_OK") {
            self.thresholds.threads_ok = parse_env("THREADS_OK", &v)?;
        }
        if let Some(v) = var("THREADS_WARN") {
            self.thresholds.threads_warn = parse_env("THREADS_WARN", &v)?;
        }

        Ok(())
    }

    /// Validate configuration, returning every problem found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("port must be non-zero".to_string());
        }
        if self.watched_port == 0 {
            errors.push("watched_port must be non-zero".to_string());
        }
        if self.command_timeout.is_zero() {
            errors.push("command_timeout must be greater than zero".to_string());
        }
        if self.disk_device.trim().is_empty() {
            errors.push("disk_device must not be empty".to_string());
        }
        if self.tmp_path.trim().is_empty() {
            errors.push("tmp_path must not be empty".to_string());
        }

        let t = &self.thresholds;
        if t.percent_ok >= t.percent_warn {
            errors.push(format!(
                "thresholds.percent_ok ({}) must be below thresholds.percent_warn ({})",
                t.percent_ok, t.percent_warn
            ));
        }
        if t.threads_ok >= t.threads_warn {
            errors.push(format!(
                "thresholds.threads_ok ({}) must be below thresholds.threads_warn ({})",
                t.threads_ok, t.threads_warn
            ));
        }

        errors
    }

    /// Fail with all validation errors joined
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            bail!("Invalid configuration:\n  {}", errors.join("\n  "))
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {}{} '{}': {}", ENV_PREFIX, name, value, e))
}

/// Durations as humantime strings ("10s", "1m 30s")
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
