use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Largest number of significant digits a decimal comparison may use.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 15;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub navigation: NavigationConfig,
    pub runner: RunnerConfig,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Navigation engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationConfig {
    /// Significant digits used when comparing decimal answers without an
    /// explicit accuracy.
    pub significant_digits: u32,
    /// Validate the node tree after decoding.
    pub validate_on_load: bool,
}

/// Host runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory that nested assessment resources are loaded from.
    pub resource_dir: Option<PathBuf>,
    /// Upper bound on forward moves before the runner gives up.
    pub max_steps: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let significant_digits = match env::var("NAV_SIGNIFICANT_DIGITS") {
            Ok(raw) => raw.parse::<u32>().map_err(|_| AppError::Config {
                message: format!("NAV_SIGNIFICANT_DIGITS must be a number, got '{}'", raw),
            })?,
            Err(_) => NavigationConfig::default().significant_digits,
        };
        if significant_digits > MAX_SIGNIFICANT_DIGITS {
            return Err(AppError::Config {
                message: format!(
                    "NAV_SIGNIFICANT_DIGITS must be at most {}, got {}",
                    MAX_SIGNIFICANT_DIGITS, significant_digits
                ),
            });
        }

        let navigation = NavigationConfig {
            significant_digits,
            validate_on_load: env::var("NAV_VALIDATE_ON_LOAD")
                .ok()
                .map(|s| !matches!(s.to_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(true),
        };

        let runner = RunnerConfig {
            resource_dir: env::var("ASSESSMENT_RESOURCE_DIR").ok().map(PathBuf::from),
            max_steps: env::var("RUNNER_MAX_STEPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
        };

        Ok(Config {
            logging,
            navigation,
            runner,
        })
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            significant_digits: 5,
            validate_on_load: true,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            resource_dir: None,
            max_steps: 500,
        }
    }
}
