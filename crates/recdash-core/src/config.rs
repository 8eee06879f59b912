//! Client configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/recdash/config.toml)
//! 3. Environment variables (RECDASH_* prefix)
//!
//! Environment variables take precedence over config file values.
//!
//! This is the dashboard's own configuration (where the recorder lives and how
//! often to talk to it). The recorder's streamer list is fetched over the API,
//! see [`crate::models::RemoteConfig`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "RECDASH";

/// Default recorder address
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the recorder web API (http or https)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Directory for local state (debug log)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log file for TUI mode (defaults to {data_dir}/debug.log)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Number of log lines requested from the recorder
    #[serde(default = "default_log_lines")]
    pub log_lines: usize,

    /// Seconds between heartbeat frames on the event connection
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Seconds between status polls while the event connection is open
    #[serde(default = "default_status_poll_secs")]
    pub status_poll_secs: u64,

    /// Seconds between file listing / log tail refreshes
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    /// Seconds to wait before reconnecting the event connection
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Timeout for a single REST request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            data_dir: default_data_dir(),
            log_file: None,
            log_lines: default_log_lines(),
            heartbeat_secs: default_heartbeat_secs(),
            status_poll_secs: default_status_poll_secs(),
            refresh_secs: default_refresh_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (RECDASH_SERVER_URL, RECDASH_DATA_DIR, RECDASH_LOG_FILE)
    /// 2. Config file (~/.config/recdash/config.toml or RECDASH_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load only what the file says, without environment overrides
    ///
    /// Use this before editing and saving the file.
    pub fn load_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // RECDASH_SERVER_URL
        if let Ok(val) = std::env::var(format!("{}_SERVER_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.server_url = val;
            }
        }

        // RECDASH_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // RECDASH_LOG_FILE
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Ensure data directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with RECDASH_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recdash")
            .join("config.toml")
    }

    /// Path of the TUI debug log
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("debug.log"))
    }

    /// Periodic intervals are at least one second
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs.max(1))
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// At least one second; a zero timeout fails every request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recdash")
}

fn default_log_lines() -> usize {
    100
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_status_poll_secs() -> u64 {
    5
}

fn default_refresh_secs() -> u64 {
    10
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "RECDASH_SERVER_URL",
        "RECDASH_DATA_DIR",
        "RECDASH_LOG_FILE",
        "RECDASH_CONFIG",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.log_lines, 100);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.status_poll_interval(), Duration::from_secs(5));
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));
        assert_eq!(config.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.data_dir.ends_with("recdash"));
    }

    #[test]
    fn test_zero_durations_clamped() {
        let config = Config {
            heartbeat_secs: 0,
            status_poll_secs: 0,
            refresh_secs: 0,
            reconnect_delay_secs: 0,
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(1));
        assert_eq!(config.status_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
        assert_eq!(config.reconnect_delay(), Duration::ZERO);
    }

    #[test]
    fn test_load_file_ignores_env() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "server_url = \"http://recorder:9000\"\n").unwrap();

        env::set_var("RECDASH_SERVER_URL", "http://override:1");
        env::set_var("RECDASH_LOG_FILE", "/tmp/override.log");

        let file_only = Config::load_file(&path).unwrap();
        assert_eq!(file_only.server_url, "http://recorder:9000");
        assert!(file_only.log_file.is_none());

        let effective = Config::load_from_path(&path).unwrap();
        assert_eq!(effective.server_url, "http://override:1");
    }

    #[test]
    fn test_log_path() {
        let mut config = Config::default();
        assert!(config.log_path().ends_with("debug.log"));

        config.log_file = Some(PathBuf::from("/tmp/recdash.log"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/recdash.log"));
    }

    #[test]
    fn test_env_override_server_url() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("RECDASH_SERVER_URL", "https://recorder.lan:8443");
        config.apply_env_overrides();
        assert_eq!(config.server_url, "https://recorder.lan:8443");

        // Empty string keeps the current value
        env::set_var("RECDASH_SERVER_URL", "");
        config.apply_env_overrides();
        assert_eq!(config.server_url, "https://recorder.lan:8443");
    }

    #[test]
    fn test_env_override_log_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("RECDASH_LOG_FILE", "/var/log/recdash.log");
        config.apply_env_overrides();
        assert_eq!(config.log_file, Some(PathBuf::from("/var/log/recdash.log")));

        env::set_var("RECDASH_LOG_FILE", "");
        config.apply_env_overrides();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_load_from_str_partial() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            server_url = "http://10.0.0.5:8000"
            status_poll_secs = 2
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.server_url, "http://10.0.0.5:8000");
        assert_eq!(config.status_poll_secs, 2);
        // Unset fields fall back to defaults
        assert_eq!(config.heartbeat_secs, 30);
        assert_eq!(config.reconnect_delay_secs, 5);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/recdash/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            server_url: "http://recorder:9000".to_string(),
            refresh_secs: 30,
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded.server_url, "http://recorder:9000");
        assert_eq!(loaded.refresh_secs, 30);
    }

    #[test]
    fn test_config_file_path_env_override() {
        let _guard = EnvGuard::new(ENV_VARS);

        env::set_var("RECDASH_CONFIG", "/etc/recdash.toml");
        assert_eq!(Config::config_file_path(), PathBuf::from("/etc/recdash.toml"));
    }
}
