//! Configuration management for planwise.
//!
//! Configuration can be set via environment variables (a `.env` file in the
//! working directory is loaded by the binary before reading them):
//! - `OPENAI_API_KEY` - Provider API key. Not validated at startup; a missing
//!   key surfaces as an error on the first model call.
//! - `OPENAI_BASE_URL` - Optional. OpenAI-compatible API base. Defaults to `https://api.openai.com/v1`.
//! - `DEFAULT_MODEL` - Optional. Model identifier. Defaults to `gpt-4o-mini`.
//! - `MODEL_TIMEOUT_SECS` - Optional. Upper bound for a single model call. Defaults to `60`.
//! - `MAX_ITERATIONS` - Optional. Caps the reactive tool loop. Unset means no cap.
//! - `SEARCH_DATA_PATH` - Optional. JSON file with facts served by the `search` tool.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provider API key
    pub api_key: Option<String>,

    /// OpenAI-compatible endpoint base URL
    pub base_url: String,

    /// Model identifier used for planning and execution
    pub default_model: String,

    /// Timeout applied to every model call
    pub model_timeout: Duration,

    /// Optional cap on reactive loop iterations
    pub max_iterations: Option<usize>,

    /// Fact file for the search tool
    pub search_data_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty());

        let base_url = lookup("OPENAI_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let default_model =
            lookup("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs: u64 = lookup("MODEL_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_MODEL_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MODEL_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "MODEL_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let max_iterations = lookup("MAX_ITERATIONS")
            .map(|v| {
                v.parse::<usize>().map_err(|e| {
                    ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e))
                })
            })
            .transpose()?;

        let search_data_path = lookup("SEARCH_DATA_PATH").map(PathBuf::from);

        Ok(Self {
            api_key,
            base_url,
            default_model,
            model_timeout: Duration::from_secs(timeout_secs),
            max_iterations,
            search_data_path,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>, default_model: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            max_iterations: None,
            search_data_path: None,
        }
    }
}
