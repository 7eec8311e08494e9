use crate::error::ConfigError;
use url::Url;

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_KEY: &str = "SUPABASE_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_TOP_K: &str = "DOCCHAT_TOP_K";
pub const ENV_MAX_CONTEXT_CHARS: &str = "DOCCHAT_MAX_CONTEXT_CHARS";

pub const DEFAULT_TOP_K: usize = 4;

/// Process configuration resolved once at startup. The three credentials are
/// required; missing any of them is fatal.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_key: String,
    pub openai_api_key: String,
    pub top_k: usize,
    pub max_context_chars: Option<usize>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let supabase_url = require(&lookup, ENV_SUPABASE_URL)?;
        let supabase_key = require(&lookup, ENV_SUPABASE_KEY)?;
        let openai_api_key = require(&lookup, ENV_OPENAI_API_KEY)?;

        Url::parse(&supabase_url)?;

        let top_k = match lookup(ENV_TOP_K) {
            Some(raw) => parse_positive(ENV_TOP_K, &raw)?,
            None => DEFAULT_TOP_K,
        };
        let max_context_chars = match lookup(ENV_MAX_CONTEXT_CHARS) {
            Some(raw) => Some(parse_positive(ENV_MAX_CONTEXT_CHARS, &raw)?),
            None => None,
        };

        Ok(Self {
            supabase_url,
            supabase_key,
            openai_api_key,
            top_k,
            max_context_chars,
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, ConfigError> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name.to_string())),
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            details: format!("expected a positive integer, got {raw:?}"),
        }),
    }
}
