//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub tutors_path: PathBuf,
    pub photo_dir: PathBuf,
    pub frontend_dir: PathBuf,
    pub admin_password: Option<String>,
    pub sweep_period: Duration,
    pub presence_timeout: Duration,
    pub expire_unseen: bool,
    pub cors_origin: Option<String>,
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

        // --- Server Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = std::env::var("CORS_ORIGIN").ok();

        // --- Storage Locations ---
        let tutors_path = path_var("TUTORS_PATH", "./FUTURE_USERS_LOOK_HERE/tutors.xlsx");
        let photo_dir = path_var("PHOTO_DIR", "./frontend/photos");
        let frontend_dir = path_var("FRONTEND_DIR", "./frontend");

        // --- Admin ---
        let admin_password = std::env::var("ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        // --- Presence Expiry ---
        let sweep_period = seconds_var("PRESENCE_SWEEP_SECS", 30)?;
        let presence_timeout = match std::env::var("PRESENCE_TIMEOUT_SECS") {
            Ok(_) => seconds_var("PRESENCE_TIMEOUT_SECS", 30)?,
            Err(_) => sweep_period,
        };
        let expire_unseen = bool_var("EXPIRE_UNSEEN", true)?;

        Ok(Self {
            bind_address,
            log_level,
            tutors_path,
            photo_dir,
            frontend_dir,
            admin_password,
            sweep_period,
            presence_timeout,
            expire_unseen,
            cors_origin,
        })
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn seconds_var(name: &str, default: u64) -> Result<Duration, ConfigError> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(Duration::from_secs(default));
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::InvalidValue(
            name.to_string(),
            "must be at least one second".to_string(),
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(ConfigError::InvalidValue(name.to_string(), e.to_string())),
    }
}

fn bool_var(name: &str, default: bool) -> Result<bool, ConfigError> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    parse_flag(&raw)
        .ok_or_else(|| ConfigError::InvalidValue(name.to_string(), format!("'{}' is not a boolean", raw)))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
