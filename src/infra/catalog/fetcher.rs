// Responsible for all communication with the catalog website.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("catalog {url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Where the pipeline gets its markup from.
///
/// Failures are returned, never panicked; the pipeline turns them into an empty run.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn url(&self) -> &str;

    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Single GET against a fixed URL, bounded by a timeout, no retries.
pub struct HttpCatalogFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpCatalogFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("books-catalog-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogFetcher {
    fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String, FetchError> {
        info!(url = %self.url, "fetching catalog");
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        info!(url = %self.url, bytes = body.len(), "catalog fetched");
        Ok(body)
    }
}
