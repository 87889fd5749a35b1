//! Client for the ranked news feed.
//!
//! The feed answers a single GET with `{ "data": [ {title, cover?, link}, ... ] }`.
//! There is no pagination, caching or retry: one attempt per call, and any
//! failure is reported as [`PublishError::FeedUnavailable`].

use crate::error::PublishError;
use crate::models::{Article, FeedResponse};
use crate::utils::truncate_for_log;
use tracing::{debug, info, instrument, warn};

/// Fetches today's article list from a fixed endpoint.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    url: String,
}

impl FeedClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Retrieve the article list in feed order.
    #[instrument(level = "info", skip_all, fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<Vec<Article>, PublishError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PublishError::feed(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Feed returned non-success status");
            return Err(PublishError::feed(&self.url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PublishError::feed(&self.url, e))?;

        let feed: FeedResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body_preview = %truncate_for_log(&body, 300),
                "Feed payload did not match the expected shape"
            );
            PublishError::feed(&self.url, format!("malformed payload: {e}"))
        })?;

        info!(count = feed.data.len(), "Fetched feed articles");
        debug!(titles = ?feed.data.iter().map(|a| &a.title).collect::<Vec<_>>(), "Feed titles");
        Ok(feed.data)
    }
}
