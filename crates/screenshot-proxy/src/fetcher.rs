//! Client for the third-party screenshot rendering service

use crate::error::{ProxyError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// HTTP client that asks the rendering service for a PNG of a page
pub struct ScreenshotFetcher {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl ScreenshotFetcher {
    /// Create a new fetcher. `timeout` bounds the whole upstream request.
    pub fn new(endpoint: Url, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Build the rendering request for a page at the given viewport size
    pub fn request_url(&self, page_url: &str, width: u32, height: u32) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("url", page_url)
                .append_pair("viewport_width", &width.to_string())
                .append_pair("viewport_height", &height.to_string())
                .append_pair("format", "png");
            if let Some(key) = &self.api_key {
                query.append_pair("access_key", key);
            }
        }
        url
    }

    /// Render a screenshot of `page_url`
    pub async fn fetch(&self, page_url: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        let url = self.request_url(page_url, width, height);
        debug!(page_url, width, height, "Requesting screenshot");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), page_url, "Screenshot service returned an error");
            return Err(ProxyError::Upstream(format!(
                "status {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();

        // Cached blobs are always served back as PNG
        if !content_type.starts_with("image/png") {
            return Err(ProxyError::Upstream(format!(
                "unexpected content type {}",
                content_type
            )));
        }

        let data = response.bytes().await?.to_vec();
        if data.is_empty() {
            return Err(ProxyError::Upstream("empty screenshot".to_string()));
        }

        debug!(page_url, size = data.len(), "Fetched screenshot");
        Ok(data)
    }
}
