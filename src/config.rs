//! Configuration management for dockmate
//!
//! Settings are loaded from environment variables with defaults; CLI flags
//! override individual values afterwards.
//!
//! # Environment Variables
//!
//! - `DOCKMATE_LOG_LEVEL`: Logging level - default: "info"
//! - `DOCKMATE_MAX_BYTES`: Fetch byte limit - default: "104857600" (100 MiB)
//! - `DOCKMATE_MAX_FILES`: Fetch file-count limit - default: "20000"
//! - `DOCKMATE_FETCH_TIMEOUT`: Fetch timeout in seconds - default: "120"
//! - `DOCKMATE_FETCH_ATTEMPTS`: Attempts for transient transport errors - default: "3"
//! - `DOCKMATE_SCAN_DEPTH`: Classifier walk depth - default: "6"
//! - `DOCKMATE_WORKSPACE_DIR`: Parent of per-request workspaces - default: system temp dir
//! - `DOCKMATE_GIT_BIN`: git executable - default: "git"
//! - `DOCKMATE_CI_TARGET`: Workflow target (github|gitlab) - default: "github"
//!
//! # Example
//!
//! ```no_run
//! use dockmate::DockmateConfig;
//!
//! let config = DockmateConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::fetch::FetchLimits;
use crate::pipeline::phases::scan::ScanConfig;
use crate::pipeline::request::CiTarget;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;
const DEFAULT_MAX_FILES: usize = 20_000;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;
const DEFAULT_FETCH_ATTEMPTS: u32 = 3;
const DEFAULT_SCAN_DEPTH: usize = 6;
const DEFAULT_GIT_BIN: &str = "git";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockmateConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    pub max_bytes: u64,
    pub max_files: usize,
    pub fetch_timeout_secs: u64,
    pub fetch_attempts: u32,
    pub scan_depth: usize,
    /// Parent of per-request workspaces; `None` uses the system temp dir
    pub workspace_dir: Option<PathBuf>,
    pub git_bin: String,
    pub ci_target: CiTarget,
}

impl Default for DockmateConfig {
    /// Loads from environment variables, falling back to defaults for
    /// missing or unparsable values. Use [`DockmateConfig::from_env`] to
    /// reject unparsable values instead.
    fn default() -> Self {
        Self {
            log_level: env::var("DOCKMATE_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
            max_bytes: env_or("DOCKMATE_MAX_BYTES", DEFAULT_MAX_BYTES),
            max_files: env_or("DOCKMATE_MAX_FILES", DEFAULT_MAX_FILES),
            fetch_timeout_secs: env_or("DOCKMATE_FETCH_TIMEOUT", DEFAULT_FETCH_TIMEOUT_SECS),
            fetch_attempts: env_or("DOCKMATE_FETCH_ATTEMPTS", DEFAULT_FETCH_ATTEMPTS),
            scan_depth: env_or("DOCKMATE_SCAN_DEPTH", DEFAULT_SCAN_DEPTH),
            workspace_dir: env::var("DOCKMATE_WORKSPACE_DIR").ok().map(PathBuf::from),
            git_bin: env::var("DOCKMATE_GIT_BIN").unwrap_or_else(|_| DEFAULT_GIT_BIN.to_string()),
            ci_target: env::var("DOCKMATE_CI_TARGET")
                .ok()
                .and_then(|v| CiTarget::from_name(&v))
                .unwrap_or_default(),
        }
    }
}

impl DockmateConfig {
    /// Like `Default`, but a set variable that does not parse is an error
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default();
        check_parses::<u64>("DOCKMATE_MAX_BYTES")?;
        check_parses::<usize>("DOCKMATE_MAX_FILES")?;
        check_parses::<u64>("DOCKMATE_FETCH_TIMEOUT")?;
        check_parses::<u32>("DOCKMATE_FETCH_ATTEMPTS")?;
        check_parses::<usize>("DOCKMATE_SCAN_DEPTH")?;
        if let Ok(value) = env::var("DOCKMATE_CI_TARGET") {
            if CiTarget::from_name(&value).is_none() {
                return Err(ConfigError::ParseError {
                    field: "DOCKMATE_CI_TARGET".to_string(),
                    error: format!("'{}' is not one of github, gitlab", value),
                });
            }
        }
        Ok(config)
    }

    /// Checks that numeric values are in range and the log level is known
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("max bytes", self.max_bytes, 1024, 4 * 1024 * 1024 * 1024)?;
        check_range("max files", self.max_files as u64, 1, 1_000_000)?;
        check_range("fetch timeout", self.fetch_timeout_secs, 1, 3600)?;
        check_range("fetch attempts", self.fetch_attempts as u64, 1, 10)?;
        check_range("scan depth", self.scan_depth as u64, 1, 32)?;

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if self.git_bin.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "git executable must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fetch_limits(&self) -> FetchLimits {
        FetchLimits {
            max_bytes: self.max_bytes,
            max_files: self.max_files,
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            attempts: self.fetch_attempts,
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            max_depth: self.scan_depth,
            max_files: self.max_files,
            ..Default::default()
        }
    }
}

impl fmt::Display for DockmateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dockmate Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Max Bytes: {}", self.max_bytes)?;
        writeln!(f, "  Max Files: {}", self.max_files)?;
        writeln!(f, "  Fetch Timeout: {}s", self.fetch_timeout_secs)?;
        writeln!(f, "  Fetch Attempts: {}", self.fetch_attempts)?;
        writeln!(f, "  Scan Depth: {}", self.scan_depth)?;
        match &self.workspace_dir {
            Some(dir) => writeln!(f, "  Workspace Dir: {}", dir.display())?,
            None => writeln!(f, "  Workspace Dir: {}", env::temp_dir().display())?,
        }
        writeln!(f, "  Git: {}", self.git_bin)?;
        writeln!(f, "  CI Target: {}", self.ci_target)?;
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn check_parses<T: FromStr>(key: &str) -> Result<(), ConfigError>
where
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(|_| ())
            .map_err(|e| ConfigError::ParseError {
                field: key.to_string(),
                error: e.to_string(),
            }),
        Err(_) => Ok(()),
    }
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::ValidationFailed(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    const ALL_VARS: &[&str] = &[
        "DOCKMATE_LOG_LEVEL",
        "DOCKMATE_MAX_BYTES",
        "DOCKMATE_MAX_FILES",
        "DOCKMATE_FETCH_TIMEOUT",
        "DOCKMATE_FETCH_ATTEMPTS",
        "DOCKMATE_SCAN_DEPTH",
        "DOCKMATE_WORKSPACE_DIR",
        "DOCKMATE_GIT_BIN",
        "DOCKMATE_CI_TARGET",
    ];

    fn clean_env() -> Vec<EnvGuard> {
        ALL_VARS.iter().map(|k| EnvGuard::unset(k)).collect()
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = clean_env();
        let config = DockmateConfig::default();

        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.max_files, DEFAULT_MAX_FILES);
        assert_eq!(config.fetch_timeout_secs, DEFAULT_FETCH_TIMEOUT_SECS);
        assert_eq!(config.fetch_attempts, DEFAULT_FETCH_ATTEMPTS);
        assert_eq!(config.workspace_dir, None);
        assert_eq!(config.ci_target, CiTarget::Github);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _clean = clean_env();
        let _guards = vec![
            EnvGuard::set("DOCKMATE_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("DOCKMATE_MAX_BYTES", "2048"),
            EnvGuard::set("DOCKMATE_FETCH_TIMEOUT", "30"),
            EnvGuard::set("DOCKMATE_WORKSPACE_DIR", "/var/tmp/dockmate"),
            EnvGuard::set("DOCKMATE_CI_TARGET", "gitlab"),
        ];

        let config = DockmateConfig::from_env().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_bytes, 2048);
        assert_eq!(config.fetch_limits().timeout, Duration::from_secs(30));
        assert_eq!(config.workspace_dir, Some(PathBuf::from("/var/tmp/dockmate")));
        assert_eq!(config.ci_target, CiTarget::Gitlab);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unparsable_values() {
        let _clean = clean_env();
        let _guard = EnvGuard::set("DOCKMATE_MAX_FILES", "lots");

        assert_eq!(DockmateConfig::default().max_files, DEFAULT_MAX_FILES);
        assert!(matches!(
            DockmateConfig::from_env(),
            Err(ConfigError::ParseError { field, .. }) if field == "DOCKMATE_MAX_FILES"
        ));
    }

    #[test]
    #[serial]
    fn test_validation_ranges() {
        let _clean = clean_env();
        let base = DockmateConfig::default();

        let config = DockmateConfig {
            fetch_timeout_secs: 0,
            ..base.clone()
        };
        assert!(config.validate().is_err());

        let config = DockmateConfig {
            max_bytes: 512,
            ..base.clone()
        };
        assert!(config.validate().is_err());

        let config = DockmateConfig {
            log_level: "loud".to_string(),
            ..base
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_display_lists_settings() {
        let _clean = clean_env();
        let text = DockmateConfig::default().to_string();
        assert!(text.contains("Max Files: 20000"));
        assert!(text.contains("CI Target: GitHub Actions"));
    }
}
