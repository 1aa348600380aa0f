use super::{Article, FetchError, NewsFetcher};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub const NEWSAPI_BASE: &str = "https://newsapi.org";

pub struct NewsApiFetcher {
    base_url: String,
    api_key: String,
    page_size: usize,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    articles: Option<Vec<RemoteArticle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
}

impl From<RemoteArticle> for Article {
    fn from(a: RemoteArticle) -> Self {
        Article {
            title: a.title.unwrap_or_default(),
            description: a.description.unwrap_or_default(),
            url: a.url,
            image: a.url_to_image,
        }
    }
}

impl NewsApiFetcher {
    pub fn new(base_url: &str, api_key: String, page_size: usize, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vibe-news/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            page_size,
            client,
        }
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/v2/everything?q={}&apiKey={}&pageSize={}",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.api_key),
            self.page_size,
        )
    }
}

#[async_trait]
impl NewsFetcher for NewsApiFetcher {
    async fn search(&self, query: &str) -> Result<Vec<Article>, FetchError> {
        tracing::debug!(query, page_size = self.page_size, "searching news");

        let response = self.client.get(self.search_url(query)).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .articles
            .unwrap_or_default()
            .into_iter()
            .take(self.page_size)
            .map(Article::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn fetcher(server: &mockito::Server) -> NewsApiFetcher {
        NewsApiFetcher::new(&server.url(), "secret".to_string(), 5, Duration::from_secs(5))
    }

    #[test]
    fn test_search_url_encodes_query() {
        let fetcher = NewsApiFetcher::new(
            "https://newsapi.org/",
            "k".to_string(),
            10,
            Duration::from_secs(1),
        );
        assert_eq!(
            fetcher.search_url("rust & go"),
            "https://newsapi.org/v2/everything?q=rust%20%26%20go&apiKey=k&pageSize=10"
        );
    }

    #[tokio::test]
    async fn test_search_maps_remote_articles() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "AI".into()),
                Matcher::UrlEncoded("apiKey".into(), "secret".into()),
                Matcher::UrlEncoded("pageSize".into(), "5".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"status":"ok","articles":[
                    {"title":"One","description":null,"url":"https://a.example/1","urlToImage":"https://a.example/1.png"},
                    {"title":"Two","description":"second","url":"https://a.example/2","urlToImage":null}
                ]}"#,
            )
            .create_async()
            .await;

        let articles = fetcher(&server).search("AI").await.unwrap();
        mock.assert_async().await;

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "One");
        assert_eq!(articles[0].description, "");
        assert_eq!(articles[0].image.as_deref(), Some("https://a.example/1.png"));
        assert_eq!(articles[1].description, "second");
        assert!(articles[1].image.is_none());
    }

    #[tokio::test]
    async fn test_search_reports_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = fetcher(&server).search("AI").await.unwrap_err();
        assert!(matches!(err, FetchError::RateLimited));
    }

    #[tokio::test]
    async fn test_search_reports_other_statuses() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"status":"error","code":"apiKeyInvalid"}"#)
            .create_async()
            .await;

        let err = fetcher(&server).search("AI").await.unwrap_err();
        assert!(matches!(err, FetchError::Status(401)));
    }

    #[tokio::test]
    async fn test_search_without_articles_field_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status":"ok","totalResults":0}"#)
            .create_async()
            .await;

        let articles = fetcher(&server).search("AI").await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let err = fetcher(&server).search("AI").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_search_truncates_to_page_size() {
        let mut server = mockito::Server::new_async().await;
        let many: Vec<String> = (0..8)
            .map(|i| format!(r#"{{"title":"t{i}","url":"https://a.example/{i}"}}"#))
            .collect();
        server
            .mock("GET", "/v2/everything")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!(r#"{{"articles":[{}]}}"#, many.join(",")))
            .create_async()
            .await;

        let articles = fetcher(&server).search("AI").await.unwrap();
        assert_eq!(articles.len(), 5);
    }
}
