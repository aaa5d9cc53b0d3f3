use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub reputation: ReputationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_allow_any_origin")]
    pub allow_any_origin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Base64-encoded HMAC-SHA256 signing key
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration_ms")]
    pub jwt_expiration_ms: i64,
    pub hash_memory_kib: Option<u32>,
    pub hash_iterations: Option<u32>,
    pub hash_parallelism: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_analysis_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_analysis_timeout")]
    pub timeout_secs: u64,
    /// Pins the date sent to the analyzer; the current UTC date is used otherwise
    pub observation_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReputationConfig {
    #[serde(default = "default_merit_threshold")]
    pub merit_threshold: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_wal_path")]
    pub wal_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: default_analysis_endpoint(),
            timeout_secs: default_analysis_timeout(),
            observation_date: None,
        }
    }
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            merit_threshold: default_merit_threshold(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            wal_path: default_wal_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_allow_any_origin() -> bool {
    true
}

fn default_jwt_expiration_ms() -> i64 {
    3_600_000 // 1 hour
}

fn default_analysis_endpoint() -> String {
    "http://127.0.0.1:5000/get-mangrove-vegetation-analysis".to_string()
}

fn default_analysis_timeout() -> u64 {
    30
}

fn default_merit_threshold() -> u32 {
    3
}

fn default_wal_path() -> PathBuf {
    PathBuf::from("mangrove.wal")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

/// HS256 keys shorter than the hash output are rejected
const MIN_SECRET_BYTES: usize = 32;

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Decoded signing key bytes
    pub fn jwt_secret_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.auth.jwt_secret.trim())
            .context("jwt_secret must be valid base64")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.server.max_body_bytes == 0 {
            bail!("max_body_bytes must be greater than 0");
        }

        let secret = self.jwt_secret_bytes()?;
        if secret.len() < MIN_SECRET_BYTES {
            bail!(
                "jwt_secret must decode to at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                secret.len()
            );
        }

        if self.auth.jwt_expiration_ms <= 0 {
            bail!("jwt_expiration_ms must be greater than 0");
        }

        if matches!(self.auth.hash_memory_kib, Some(0))
            || matches!(self.auth.hash_iterations, Some(0))
            || matches!(self.auth.hash_parallelism, Some(0))
        {
            bail!("Argon2 cost parameters must be greater than 0");
        }

        if self.analysis.endpoint.is_empty() {
            bail!("analysis endpoint must not be empty");
        }

        if self.analysis.timeout_secs == 0 {
            bail!("analysis timeout_secs must be greater than 0");
        }

        if self.reputation.merit_threshold == 0 {
            bail!("merit_threshold must be at least 1");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
