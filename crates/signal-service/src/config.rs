use anyhow::{Context, Result};
use std::env;

/// Process configuration, loaded once at startup from the environment.
/// Every field has a sane default so the service boots in a degraded-but-
/// running state with no configuration at all (missing API keys just mean
/// every provider chain link fails over to the next, or to HOLD).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub primary_market_base_url: String,
    pub primary_market_api_key: String,
    pub secondary_market_base_url: String,
    pub secondary_market_api_key: String,
    pub tertiary_market_base_url: String,
    pub tertiary_market_api_key: String,

    pub reddit_base_url: String,
    pub news_base_url: String,
    pub news_api_key: String,

    pub contrarian_llm_base_url: String,
    pub contrarian_llm_api_key: String,
    pub contrarian_model: String,
    pub growth_llm_base_url: String,
    pub growth_llm_api_key: String,
    pub growth_model: String,
    pub multimodal_llm_base_url: String,
    pub multimodal_llm_api_key: String,
    pub multimodal_model: String,

    pub signal_deadline_seconds: u64,
    pub backtest_deadline_seconds: u64,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}: {e}"))
            .with_context(|| format!("parsing {key}")),
        Err(_) => Ok(default),
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            primary_market_base_url: env_or("PRIMARY_MARKET_URL", "https://api.primary-market.test"),
            primary_market_api_key: env_or("PRIMARY_MARKET_API_KEY", ""),
            secondary_market_base_url: env_or("SECONDARY_MARKET_URL", "https://api.secondary-market.test"),
            secondary_market_api_key: env_or("SECONDARY_MARKET_API_KEY", ""),
            tertiary_market_base_url: env_or("TERTIARY_MARKET_URL", "https://api.tertiary-market.test"),
            tertiary_market_api_key: env_or("TERTIARY_MARKET_API_KEY", ""),

            reddit_base_url: env_or("REDDIT_BASE_URL", "https://www.reddit.com"),
            news_base_url: env_or("NEWS_BASE_URL", "https://newsapi.org"),
            news_api_key: env_or("NEWS_API_KEY", ""),

            contrarian_llm_base_url: env_or("CONTRARIAN_LLM_URL", "https://openrouter.ai/api/v1"),
            contrarian_llm_api_key: env_or("CONTRARIAN_LLM_API_KEY", ""),
            contrarian_model: env_or("CONTRARIAN_MODEL", "anthropic/claude-3-haiku"),
            growth_llm_base_url: env_or("GROWTH_LLM_URL", "https://openrouter.ai/api/v1"),
            growth_llm_api_key: env_or("GROWTH_LLM_API_KEY", ""),
            growth_model: env_or("GROWTH_MODEL", "openai/gpt-4o-mini"),
            multimodal_llm_base_url: env_or("MULTIMODAL_LLM_URL", "https://openrouter.ai/api/v1"),
            multimodal_llm_api_key: env_or("MULTIMODAL_LLM_API_KEY", ""),
            multimodal_model: env_or("MULTIMODAL_MODEL", "google/gemini-flash-1.5"),

            signal_deadline_seconds: env_parse_or("SIGNAL_DEADLINE_SECONDS", 45)?,
            backtest_deadline_seconds: env_parse_or("BACKTEST_DEADLINE_SECONDS", 300)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse_without_any_env_vars() {
        let config = ServiceConfig {
            primary_market_base_url: String::new(),
            primary_market_api_key: String::new(),
            secondary_market_base_url: String::new(),
            secondary_market_api_key: String::new(),
            tertiary_market_base_url: String::new(),
            tertiary_market_api_key: String::new(),
            reddit_base_url: String::new(),
            news_base_url: String::new(),
            news_api_key: String::new(),
            contrarian_llm_base_url: String::new(),
            contrarian_llm_api_key: String::new(),
            contrarian_model: String::new(),
            growth_llm_base_url: String::new(),
            growth_llm_api_key: String::new(),
            growth_model: String::new(),
            multimodal_llm_base_url: String::new(),
            multimodal_llm_api_key: String::new(),
            multimodal_model: String::new(),
            signal_deadline_seconds: 45,
            backtest_deadline_seconds: 300,
        };
        assert_eq!(config.signal_deadline_seconds, 45);
    }
}
