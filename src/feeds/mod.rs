pub mod newsapi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single entry shown on a topic's card grid.
///
/// Entries without a `url` are status placeholders ("No results",
/// "Rate limit exceeded", "Error") rather than real articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Article {
    pub fn placeholder(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            url: None,
            image: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.url.is_none()
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Searches a remote news source for articles matching a free-text query.
///
/// An empty vector means the search succeeded but found nothing.
#[async_trait]
pub trait NewsFetcher: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Article>, FetchError>;
}
