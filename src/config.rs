use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::api_connection::endpoints::{DEFAULT_MODEL, OPENROUTER_BASE_URL};

pub const RECIPES_PATH_VAR: &str = "NUTRI_RECIPES_PATH";
pub const USERS_PATH_VAR: &str = "NUTRI_USERS_PATH";
pub const BIND_ADDR_VAR: &str = "NUTRI_BIND_ADDR";
pub const RESULT_LIMIT_VAR: &str = "NUTRI_RESULT_LIMIT";
pub const LLM_MODEL_VAR: &str = "NUTRI_LLM_MODEL";
pub const LLM_BASE_URL_VAR: &str = "NUTRI_LLM_BASE_URL";
pub const LLM_TIMEOUT_VAR: &str = "NUTRI_LLM_TIMEOUT_SECS";
pub const LLM_API_KEY_VAR_VAR: &str = "NUTRI_LLM_API_KEY_VAR";

pub const DEFAULT_API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";
pub const DEFAULT_RESULT_LIMIT: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Name of the environment variable that holds the API key.
    pub api_key_env_var: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub recipes_path: PathBuf,
    pub users_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// Maximum number of recipes returned by a search.
    pub result_limit: usize,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let result_limit: usize = parse_or(&lookup, RESULT_LIMIT_VAR, DEFAULT_RESULT_LIMIT)?;
        if result_limit == 0 {
            return Err(ConfigError::Invalid {
                key: RESULT_LIMIT_VAR,
                value: "0".to_string(),
            });
        }
        let timeout_secs: u64 = parse_or(&lookup, LLM_TIMEOUT_VAR, 60)?;

        Ok(Self {
            recipes_path: PathBuf::from(text(RECIPES_PATH_VAR, "data/recipes.csv")),
            users_path: PathBuf::from(text(USERS_PATH_VAR, "data/users.csv")),
            bind_addr: parse_or(&lookup, BIND_ADDR_VAR, SocketAddr::from(([127, 0, 0, 1], 8000)))?,
            result_limit,
            llm: LlmConfig {
                api_key_env_var: text(LLM_API_KEY_VAR_VAR, DEFAULT_API_KEY_ENV_VAR),
                model: text(LLM_MODEL_VAR, DEFAULT_MODEL),
                base_url: text(LLM_BASE_URL_VAR, OPENROUTER_BASE_URL),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
