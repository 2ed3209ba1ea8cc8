use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.hunter.io/v2";
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the contact lookup client, passed explicitly to its constructor.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl LookupConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: LOOKUP_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Loads configuration from the environment (and `.env` if present).
    /// `api_key_override` takes precedence over `HUNTER_API_KEY`.
    pub fn from_env(api_key_override: Option<&str>) -> Result<Self> {
        let _ = dotenv();

        let api_key = match api_key_override {
            Some(key) => key.to_string(),
            None => env::var("HUNTER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .context(
                    "HUNTER_API_KEY not found. Create a .env file containing \
                     HUNTER_API_KEY=your_api_key_here or pass --api-key",
                )?,
        };

        let config = Self::new(api_key);
        Ok(match env::var("HUNTER_API_BASE") {
            Ok(base) if !base.trim().is_empty() => config.with_base_url(base),
            _ => config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LookupConfig::new("secret");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, "https://api.hunter.io/v2");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = LookupConfig::new("k").with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_override_skips_environment_lookup() {
        let config = LookupConfig::from_env(Some("from-flag")).unwrap();
        assert_eq!(config.api_key, "from-flag");
    }
}
