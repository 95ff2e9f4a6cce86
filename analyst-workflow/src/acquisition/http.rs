use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::AcquisitionConfig;
use crate::resilience::{retry, ExponentialBackoff, RetryError, Retryable};

/// Failure of a single HTTP attempt.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server responded {0}")]
    Status(StatusCode),

    #[error("could not read response body: {0}")]
    Body(String),
}

impl Retryable for FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) | FetchError::Body(_) => true,
            FetchError::Status(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
        }
    }
}

/// A successfully downloaded document.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub url: Url,
    pub content_type: Option<String>,
    pub body: String,
}

/// HTTP GET with a per-request timeout and bounded retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    policy: ExponentialBackoff,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &AcquisitionConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            policy: ExponentialBackoff::new(config.retry_config()),
            timeout: config.timeout(),
        })
    }

    pub async fn fetch(&self, url: &Url) -> Result<FetchedDocument, RetryError<FetchError>> {
        info!(url = %url, "Fetching data source");
        let document = retry(&self.policy, || self.fetch_once(url)).await?;
        debug!(
            url = %url,
            bytes = document.body.len(),
            content_type = document.content_type.as_deref().unwrap_or("unknown"),
            "Fetched data source"
        );
        Ok(document)
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        metrics::counter!("acquisition_attempts_total").increment(1);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        Ok(FetchedDocument {
            url: url.clone(),
            content_type,
            body,
        })
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(error.to_string())
        }
    }
}
