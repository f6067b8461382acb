//! Request and response types for the screenshot proxy

use screenshot_cache::CacheStats;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 630;
pub const MAX_DIMENSION: u32 = 4096;

/// Query string of `GET /screenshot`
#[derive(Debug, Deserialize)]
pub struct ScreenshotQuery {
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A validated screenshot request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotRequest {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl TryFrom<ScreenshotQuery> for ScreenshotRequest {
    type Error = String;

    fn try_from(query: ScreenshotQuery) -> Result<Self, Self::Error> {
        let raw = query
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| "Missing url parameter".to_string())?;

        let parsed = url::Url::parse(raw.trim()).map_err(|_| "Invalid url parameter".to_string())?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err("Only http and https urls are supported".to_string());
        }

        let width = query.width.unwrap_or(DEFAULT_WIDTH);
        let height = query.height.unwrap_or(DEFAULT_HEIGHT);
        for (name, value) in [("width", width), ("height", height)] {
            if value == 0 || value > MAX_DIMENSION {
                return Err(format!("{} must be between 1 and {}", name, MAX_DIMENSION));
            }
        }

        Ok(Self {
            url: raw.trim().to_string(),
            width,
            height,
        })
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
}

/// Response of `DELETE /screenshot`
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
    pub removed: usize,
}
