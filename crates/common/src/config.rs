use crate::Result;
use anyhow::Context;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

// TOML configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub influx: InfluxConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// InfluxDB v2 への接続情報
#[derive(Debug, Deserialize, Clone)]
pub struct InfluxConfig {
    #[serde(default = "default_influx_url")]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub org: String,
    #[serde(default = "default_influx_bucket")]
    pub bucket: String,
    #[serde(default = "default_influx_timeout")]
    pub timeout: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// 描画時に時刻へ加算するオフセット（UTC からローカル表示へのずらし）
    #[serde(default = "default_time_offset")]
    pub time_offset: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweepConfig {
    #[serde(default = "default_sweep_window")]
    pub window: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_rust_log_format")]
    pub rust_log_format: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("influx.{0} is empty")]
    Missing(&'static str),
    #[error("invalid duration for {key}: {value:?}")]
    InvalidDuration { key: &'static str, value: String },
}

// Default values
fn default_influx_url() -> String {
    "http://localhost:8086".to_string()
}
fn default_influx_bucket() -> String {
    "rooftop".to_string()
}
fn default_influx_timeout() -> String {
    "5m".to_string()
}
fn default_time_offset() -> String {
    "2h".to_string()
}
fn default_sweep_window() -> String {
    "1s".to_string()
}
fn default_rust_log_format() -> String {
    "term".to_string()
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: default_influx_url(),
            token: String::new(),
            org: String::new(),
            bucket: default_influx_bucket(),
            timeout: default_influx_timeout(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_offset: default_time_offset(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            window: default_sweep_window(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log_format: default_rust_log_format(),
        }
    }
}

fn parse_duration(key: &'static str, value: &str) -> std::result::Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|_| ConfigError::InvalidDuration {
        key,
        value: value.to_string(),
    })
}

impl InfluxConfig {
    /// url, token, org が揃っていることを確認する
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing("url"));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::Missing("token"));
        }
        if self.org.trim().is_empty() {
            return Err(ConfigError::Missing("org"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::result::Result<Duration, ConfigError> {
        parse_duration("influx.timeout", &self.timeout)
    }
}

impl DisplayConfig {
    pub fn time_offset(&self) -> std::result::Result<Duration, ConfigError> {
        parse_duration("display.time_offset", &self.time_offset)
    }
}

impl SweepConfig {
    pub fn window(&self) -> std::result::Result<Duration, ConfigError> {
        parse_duration("sweep.window", &self.window)
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Install the configuration used for the rest of the process.
///
/// The first installed (or lazily loaded) value wins.
pub fn install(config: Config) -> &'static Config {
    CONFIG.get_or_init(|| config)
}

/// Get the process-wide configuration, loading it from the default
/// locations if nothing has been installed yet.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::load(None).unwrap_or_else(|e| {
            eprintln!(
                "Warning: Failed to load config files: {}. Using defaults.",
                e
            );
            Config::default()
        })
    })
}

impl Config {
    /// Load configuration with priority (later wins):
    /// 1. Default values
    /// 2. config/config.toml (git-managed template)
    /// 3. config/config.local.toml (git-ignored, for local overrides)
    /// 4. the explicitly given file
    /// 5. INFLUX_* environment variables
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::load_from_dir(Path::new("config"), explicit)?;
        config.apply_env_with(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Files only, no environment.
    pub fn load_from_dir(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        let base_path = dir.join("config.toml");
        if base_path.exists() {
            config = Self::read_file(&base_path)?;
        }

        let local_path = dir.join("config.local.toml");
        if local_path.exists() {
            let local_config = Self::read_file(&local_path)?;
            merge_config(&mut config, local_config);
        }

        if let Some(path) = explicit {
            let explicit_config = Self::read_file(path)?;
            merge_config(&mut config, explicit_config);
        }

        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// 環境変数で接続情報を上書きする（空文字は無視）
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get("INFLUX_URL") {
            self.influx.url = v;
        }
        if let Some(v) = get("INFLUX_TOKEN") {
            self.influx.token = v;
        }
        if let Some(v) = get("INFLUX_ORG") {
            self.influx.org = v;
        }
        if let Some(v) = get("INFLUX_BUCKET") {
            self.influx.bucket = v;
        }
        if let Some(v) = get("LOG_FORMAT") {
            self.logging.rust_log_format = v;
        }
    }
}

/// Merge local config into base config (local values override base values)
fn merge_config(base: &mut Config, local: Config) {
    // Influx
    if local.influx.url != default_influx_url() {
        base.influx.url = local.influx.url;
    }
    if !local.influx.token.is_empty() {
        base.influx.token = local.influx.token;
    }
    if !local.influx.org.is_empty() {
        base.influx.org = local.influx.org;
    }
    if local.influx.bucket != default_influx_bucket() {
        base.influx.bucket = local.influx.bucket;
    }
    if local.influx.timeout != default_influx_timeout() {
        base.influx.timeout = local.influx.timeout;
    }

    // Display
    if local.display.time_offset != default_time_offset() {
        base.display.time_offset = local.display.time_offset;
    }

    // Sweep
    if local.sweep.window != default_sweep_window() {
        base.sweep.window = local.sweep.window;
    }

    // Logging
    if local.logging.rust_log_format != default_rust_log_format() {
        base.logging.rust_log_format = local.logging.rust_log_format;
    }
}
