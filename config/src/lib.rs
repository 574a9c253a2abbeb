//! OTS Configuration
//!
//! Shared configuration crate for the OTS library and CLI.
//!
//! Handles loading configuration from:
//! 1. OTS_CONFIG env var (explicit path)
//! 2. ./ots.toml (current directory)
//! 3. ~/.ots/ots.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<OtsConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "ots.toml";
const CONFIG_DIR_NAME: &str = ".ots";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_ROUND_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOG_FILTER: &str = "info";

/// `OTS_ROOT` value that clears a configured root
const RANDOM_ROOT: &str = "random";

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtsConfig {
    #[serde(default)]
    pub round: RoundConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Decryption round settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// How long the client waits for the root's report
    #[serde(default = "default_round_timeout")]
    pub timeout_ms: u64,
    /// Children per tree node; unset means a star under the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branching: Option<usize>,
    /// Fixed root slot; unset means a random root per round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<usize>,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_ROUND_TIMEOUT_MS,
            branching: None,
            root: None,
        }
    }
}

fn default_round_timeout() -> u64 {
    DEFAULT_ROUND_TIMEOUT_MS
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.into(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.into()
}

// ============================================================================
// Env Helpers
// ============================================================================

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Set String field from env var if present
fn env_string(lookup: Lookup, key: &str, field: &mut String) {
    if let Some(v) = lookup(key) {
        *field = v;
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(lookup: Lookup, key: &str, field: &mut T) {
    if let Some(v) = lookup(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => tracing::warn!(key, value = %v, "ignoring unparseable env override"),
        }
    }
}

/// Set Option<T> from env var if present and parseable
fn env_parse_option<T: std::str::FromStr>(lookup: Lookup, key: &str, field: &mut Option<T>) {
    if let Some(v) = lookup(key) {
        match v.parse() {
            Ok(parsed) => *field = Some(parsed),
            Err(_) => tracing::warn!(key, value = %v, "ignoring unparseable env override"),
        }
    }
}

// ============================================================================
// Implementation
// ============================================================================

impl OtsConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                tracing::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = env::var("OTS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            tracing::warn!("OTS_CONFIG points at missing file: {}", path.display());
        }

        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        Self::default_config_path().filter(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(&process_env);
    }

    /// Apply overrides from any key/value source
    fn apply_overrides(&mut self, lookup: Lookup) {
        env_parse(lookup, "OTS_ROUND_TIMEOUT_MS", &mut self.round.timeout_ms);
        env_parse_option(lookup, "OTS_BRANCHING", &mut self.round.branching);

        match lookup("OTS_ROOT") {
            Some(v) if v.eq_ignore_ascii_case(RANDOM_ROOT) => self.round.root = None,
            Some(_) => env_parse_option(lookup, "OTS_ROOT", &mut self.round.root),
            None => {}
        }

        env_string(lookup, "OTS_LOG", &mut self.log.filter);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.round.branching = Some(2);
        sample.log.filter = "info,ots_core=debug".into();
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static OtsConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: OtsConfig) -> Result<(), OtsConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn overrides(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = OtsConfig::default();
        assert_eq!(config.round.timeout_ms, DEFAULT_ROUND_TIMEOUT_MS);
        assert_eq!(config.round.branching, None);
        assert_eq!(config.round.root, None);
        assert_eq!(config.log.filter, DEFAULT_LOG_FILTER);
        assert!(!config.log.json);
    }

    #[test]
    fn test_parse_sample() {
        let sample = OtsConfig::generate_sample();
        assert!(sample.contains("[round]"));
        assert!(sample.contains("[log]"));

        let parsed: OtsConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.round.branching, Some(2));
        assert_eq!(parsed.round.root, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[round]\nroot = 3").unwrap();

        let parsed = OtsConfig::parse_file(file.path()).unwrap();
        assert_eq!(parsed.round.root, Some(3));
        assert_eq!(parsed.round.timeout_ms, DEFAULT_ROUND_TIMEOUT_MS);
        assert_eq!(parsed.log, LogConfig::default());
    }

    #[test]
    fn test_bad_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[round]\ntimeout_ms = \"soon\"").unwrap();

        let err = OtsConfig::parse_file(file.path()).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = OtsConfig::default();
        config.apply_overrides(&overrides(&[
            ("OTS_ROUND_TIMEOUT_MS", "2500"),
            ("OTS_BRANCHING", "3"),
            ("OTS_ROOT", "4"),
            ("OTS_LOG", "debug"),
        ]));
        assert_eq!(config.round.timeout_ms, 2500);
        assert_eq!(config.round.branching, Some(3));
        assert_eq!(config.round.root, Some(4));
        assert_eq!(config.log.filter, "debug");
    }

    #[test]
    fn test_random_root_clears_file_value() {
        let mut config = OtsConfig::default();
        config.round.root = Some(1);
        config.apply_overrides(&overrides(&[("OTS_ROOT", "Random")]));
        assert_eq!(config.round.root, None);
    }

    #[test]
    fn test_global_is_set_once() {
        let mut config = OtsConfig::default();
        config.round.root = Some(2);
        assert!(OtsConfig::set_global(config.clone()).is_ok());
        assert_eq!(OtsConfig::global(), &config);
        assert_eq!(
            OtsConfig::set_global(OtsConfig::default()),
            Err(OtsConfig::default())
        );
    }

    #[test]
    fn test_unparseable_override_is_ignored() {
        let mut config = OtsConfig::default();
        config.apply_overrides(&overrides(&[
            ("OTS_ROUND_TIMEOUT_MS", "ten"),
            ("OTS_ROOT", "-1"),
        ]));
        assert_eq!(config.round.timeout_ms, DEFAULT_ROUND_TIMEOUT_MS);
        assert_eq!(config.round.root, None);
    }
}
