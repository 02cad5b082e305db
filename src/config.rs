//! Service configuration read from the environment at startup

use crate::llm::DEFAULT_BASE_URL;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 4;

/// Everything the service needs to boot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Provider key. Not validated here; a missing key fails the first model call.
    pub google_api_key: Option<String>,
    pub port: u16,
    pub model: String,
    pub gemini_base_url: String,
    pub static_dir: PathBuf,
    pub system_prompt: String,
    /// Cap on user/assistant messages kept in memory
    pub max_history: Option<usize>,
    pub max_tool_rounds: usize,
    /// Send the default opening prompt to the model on an empty message
    /// instead of answering with the canned reply
    pub start_on_empty: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            port: DEFAULT_PORT,
            model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            system_prompt: crate::system_prompt::INTERVIEWER_PROMPT.to_string(),
            max_history: None,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            start_on_empty: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            google_api_key: lookup("GOOGLE_API_KEY"),
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            model: lookup("INTERVIEW_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.model),
            gemini_base_url: lookup("GEMINI_BASE_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or(defaults.gemini_base_url),
            static_dir: lookup("STATIC_DIR").map_or(defaults.static_dir, PathBuf::from),
            system_prompt: crate::system_prompt::resolve(
                lookup("INTERVIEW_SYSTEM_PROMPT").as_deref(),
            ),
            max_history: lookup("INTERVIEW_MAX_HISTORY")
                .and_then(|v| parse_nonzero("INTERVIEW_MAX_HISTORY", &v))
                .or(defaults.max_history),
            max_tool_rounds: lookup("INTERVIEW_MAX_TOOL_ROUNDS")
                .and_then(|v| parse_nonzero("INTERVIEW_MAX_TOOL_ROUNDS", &v))
                .unwrap_or(defaults.max_tool_rounds),
            start_on_empty: parse_or(
                "INTERVIEW_START_ON_EMPTY",
                lookup("INTERVIEW_START_ON_EMPTY"),
                defaults.start_on_empty,
            ),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "Ignoring unparseable configuration value");
            None
        }
    }
}

fn parse_nonzero(key: &str, raw: &str) -> Option<usize> {
    let value = parse_var::<usize>(key, raw)?;
    if value == 0 {
        tracing::warn!(key, "Ignoring zero configuration value");
        return None;
    }
    Some(value)
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    raw.and_then(|v| parse_var(key, &v)).unwrap_or(default)
}
