use crate::error::{ProxyError, Result};
use screenshot_cache::CacheConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_SCREENSHOT_API_URL: &str = "https://api.screenshotone.com/take";

/// Service configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub cache: CacheConfig,
    pub screenshot_api_url: Url,
    pub screenshot_api_key: Option<String>,
    pub fetch_timeout: Duration,
}

impl ServiceConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Parse configuration from any variable source. Unset or unparsable
    /// numbers, and a zero cache age, fall back to their defaults; a
    /// malformed API URL is an error.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = var("PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(3002);

        let defaults = CacheConfig::default();

        let cache_dir = var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let max_size = var("CACHE_MAX_SIZE")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.max_size);

        let max_age = var("CACHE_MAX_AGE_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_age);

        let api_url = var("SCREENSHOT_API_URL")
            .unwrap_or_else(|| DEFAULT_SCREENSHOT_API_URL.to_string());
        let screenshot_api_url = Url::parse(&api_url).map_err(|e| {
            ProxyError::Config(format!("invalid SCREENSHOT_API_URL {:?}: {}", api_url, e))
        })?;

        let screenshot_api_key = var("SCREENSHOT_API_KEY").filter(|k| !k.trim().is_empty());

        let fetch_timeout = var("SCREENSHOT_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(20));

        Ok(Self {
            port,
            cache: CacheConfig::new(cache_dir)
                .with_max_size(max_size)
                .with_max_age(max_age),
            screenshot_api_url,
            screenshot_api_key,
            fetch_timeout,
        })
    }
}
