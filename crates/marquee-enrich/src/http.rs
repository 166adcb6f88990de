use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{EnrichError, Result};

// ─── ApiClient ────────────────────────────────────────────────────────────────

/// Thin wrapper around a pooled `reqwest::Client`.
///
/// Every request either returns the body or fails once; callers decide what a
/// failure means. There are no retries here.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EnrichError::ApiError(
                url.to_string(),
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }
        resp.text().await.map_err(EnrichError::Http)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| EnrichError::Parse(e.to_string()))
    }
}
