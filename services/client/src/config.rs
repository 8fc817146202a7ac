//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use docchat_core::validation::{UploadConstraints, DEFAULT_ACCEPTED_MIME_TYPE, DEFAULT_MAX_UPLOAD_BYTES};
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How the intake view animates progress while the backend works.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSettings {
    pub tick: Duration,
    pub step: u8,
    /// Always below 100: only a backend acknowledgement may claim completion.
    pub cap: u8,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            step: 5,
            cap: 95,
        }
    }
}

/// Optional chunking hints forwarded with every upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkingOptions {
    pub chunk_size: Option<u32>,
    pub overlap: Option<u32>,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub user_id: String,
    pub log_level: Level,
    pub upload_constraints: UploadConstraints,
    pub progress: ProgressSettings,
    /// `None` keeps requests pending for as long as the backend takes.
    pub request_timeout: Option<Duration>,
    pub chunking: ChunkingOptions,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Backend and Caller ---
        let backend_url = lookup("BACKEND_URL")
            .unwrap_or_else(|| "http://localhost:8000".to_string())
            .trim_end_matches('/')
            .to_string();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "BACKEND_URL".to_string(),
                format!("'{}' is not an http(s) URL", backend_url),
            ));
        }

        let user_id = lookup("USER_ID")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("USER_ID".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Accepted Files ---
        let accepted_mime_types: Vec<String> = lookup("ACCEPTED_MIME_TYPES")
            .unwrap_or_else(|| DEFAULT_ACCEPTED_MIME_TYPE.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if accepted_mime_types.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ACCEPTED_MIME_TYPES".to_string(),
                "at least one MIME type is required".to_string(),
            ));
        }
        let max_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        // --- Progress Simulation ---
        let defaults = ProgressSettings::default();
        let tick_ms = parse_or(&lookup, "PROGRESS_TICK_MS", defaults.tick.as_millis() as u64)?;
        if tick_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "PROGRESS_TICK_MS".to_string(),
                "the tick interval must be positive".to_string(),
            ));
        }
        let step = parse_or(&lookup, "PROGRESS_STEP", defaults.step)?;
        let cap = parse_or(&lookup, "PROGRESS_CAP", defaults.cap)?;
        if cap >= 100 {
            return Err(ConfigError::InvalidValue(
                "PROGRESS_CAP".to_string(),
                format!("{} must be below 100", cap),
            ));
        }

        // --- Request Shaping ---
        let request_timeout = parse_opt::<u64, _>(&lookup, "REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs);
        let chunking = ChunkingOptions {
            chunk_size: parse_opt(&lookup, "CHUNK_SIZE")?,
            overlap: parse_opt(&lookup, "CHUNK_OVERLAP")?,
        };

        Ok(Self {
            backend_url,
            user_id,
            log_level,
            upload_constraints: UploadConstraints { accepted_mime_types, max_bytes },
            progress: ProgressSettings {
                tick: Duration::from_millis(tick_ms),
                step,
                cap,
            },
            request_timeout,
            chunking,
        })
    }
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(None),
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_main_intake_view() {
        let config = load(&[("USER_ID", "user-1")]).unwrap();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.upload_constraints, UploadConstraints::default());
        assert_eq!(config.progress, ProgressSettings::default());
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.chunking, ChunkingOptions::default());
    }

    #[test]
    fn user_id_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(var)) if var == "USER_ID"));
    }

    #[test]
    fn progress_cap_must_stay_below_completion() {
        let err = load(&[("USER_ID", "u"), ("PROGRESS_CAP", "100")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "PROGRESS_CAP"));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("USER_ID", "u"),
            ("BACKEND_URL", "https://docs.example.com/api/"),
            ("MAX_UPLOAD_BYTES", "2097152"),
            ("ACCEPTED_MIME_TYPES", "application/pdf, application/x-pdf"),
            ("REQUEST_TIMEOUT_SECS", "30"),
            ("CHUNK_SIZE", "800"),
        ])
        .unwrap();
        assert_eq!(config.backend_url, "https://docs.example.com/api");
        assert_eq!(config.upload_constraints.max_bytes, 2 * 1024 * 1024);
        assert_eq!(config.upload_constraints.accepted_mime_types.len(), 2);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.chunking.chunk_size, Some(800));
        assert_eq!(config.chunking.overlap, None);
    }

    #[test]
    fn garbage_numbers_are_reported_by_name() {
        let err = load(&[("USER_ID", "u"), ("MAX_UPLOAD_BYTES", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "MAX_UPLOAD_BYTES"));
    }
}
