//! The HTTP seam every resolver and inspector goes through.
//!
//! Resolvers never build their own client: they receive an `Arc<dyn Fetcher>`
//! so one connection pool is shared across concurrently processed leads and
//! tests can swap in doubles.

use crate::config::DiscoveryConfig;
use crate::error::{Result, ScanError};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::debug;

/// Desktop browser User-Agent sent with every request; plenty of storefronts
/// reject obvious bot agents outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const MAX_REDIRECTS: usize = 5;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the body. Non-2xx statuses are errors.
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String>;

    /// GET `url` and return only the final status code.
    async fn status(&self, url: &str, timeout: Duration) -> Result<u16>;
}

/// `Fetcher` backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(BROWSER_USER_AGENT)
    }

    /// Client sending the User-Agent configured for discovery.
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        Self::with_user_agent(&config.user_agent)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10) // Connection pooling
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String> {
        debug!("GET {} (timeout {:?})", url, timeout);

        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn status(&self, url: &str, timeout: Duration) -> Result<u16> {
        debug!("Probing {} (timeout {:?})", url, timeout);

        let response = self.client.get(url).timeout(timeout).send().await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    #[tokio::test]
    async fn test_get_text_sends_browser_user_agent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", BROWSER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let body = fetcher
            .get_text(&format!("{}/page", mock_server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_configured_user_agent_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "leadsift-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hi"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = DiscoveryConfig::default().with_user_agent("leadsift-test/1.0");
        let fetcher = HttpFetcher::from_config(&config).unwrap();
        let body = fetcher
            .get_text(&format!("{}/page", mock_server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(body, "hi");
    }

    #[test]
    fn test_default_config_uses_browser_user_agent() {
        assert_eq!(DiscoveryConfig::default().user_agent, BROWSER_USER_AGENT);
    }

    #[tokio::test]
    async fn test_get_text_rejects_non_success_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher
            .get_text(&format!("{}/missing", mock_server.uri()), Duration::from_secs(5))
            .await;

        assert!(matches!(
            result,
            Err(ScanError::HttpStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_status_reports_code_without_failing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let status = fetcher
            .status(&format!("{}/gone", mock_server.uri()), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(status, 410);
    }

    #[tokio::test]
    async fn test_get_text_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher
            .get_text(&format!("{}/slow", mock_server.uri()), Duration::from_millis(50))
            .await;

        assert!(matches!(result, Err(ScanError::HttpError(_))));
    }
}
