use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::api_connection::endpoints::{DEFAULT_MODEL, OPENAI_CHAT_COMPLETIONS_URL};

pub const API_URL_ENV_VAR: &str = "MEAL_PLANNER_API_URL";
pub const MODEL_ENV_VAR: &str = "MEAL_PLANNER_MODEL";
pub const TEMPERATURE_ENV_VAR: &str = "MEAL_PLANNER_TEMPERATURE";
pub const MAX_TOKENS_ENV_VAR: &str = "MEAL_PLANNER_MAX_TOKENS";
pub const PROGRESS_DELAY_ENV_VAR: &str = "MEAL_PLANNER_PROGRESS_DELAY_MS";
pub const CREDENTIALS_ENV_VAR: &str = "MEAL_PLANNER_CREDENTIALS";
/// When set, used as the API key instead of the credential file.
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_PROGRESS_DELAY_MS: u64 = 500;
pub const DEFAULT_CREDENTIALS_FILE: &str = ".meal_planner_credentials.json";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Pause between simulated progress stages.
    pub progress_delay: Duration,
    pub credentials_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: OPENAI_CHAT_COMPLETIONS_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            progress_delay: Duration::from_millis(DEFAULT_PROGRESS_DELAY_MS),
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
        }
    }
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparsable value {:?} for {}", raw, name);
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Reads overrides from the process environment. Call `dotenv()` first
    /// to pick up a `.env` file.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            api_url: env::var(API_URL_ENV_VAR).unwrap_or(defaults.api_url),
            model: env::var(MODEL_ENV_VAR).unwrap_or(defaults.model),
            temperature: parse_or(TEMPERATURE_ENV_VAR, defaults.temperature),
            max_tokens: parse_or(MAX_TOKENS_ENV_VAR, defaults.max_tokens),
            progress_delay: Duration::from_millis(parse_or(PROGRESS_DELAY_ENV_VAR, DEFAULT_PROGRESS_DELAY_MS)),
            credentials_path: env::var(CREDENTIALS_ENV_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_path),
        }
    }
}
