//! HTTP request executor.
//!
//! Sends one authenticated request with reqwest and maps the reply into a
//! `Response`. Status codes are passed through untouched; only connection
//! failures and timeouts become errors. Connection failures can be retried
//! with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use log::{debug, warn};
use reqwest::Client;

use crate::{
    config,
    core::{IntegratorError, IntegratorResult, Request, RequestSender, Response},
    utils::response::{collect_headers, parse_body},
};

/// HTTP executor configuration.
#[derive(Debug, Clone)]
pub struct HttpExecutorConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after a connection failure (0 disables retrying).
    pub retries: u32,
}

impl Default for HttpExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 0,
        }
    }
}

impl From<&config::HttpClient> for HttpExecutorConfig {
    fn from(cfg: &config::HttpClient) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.timeout),
            retries: cfg.retries,
        }
    }
}

pub struct HttpExecutor {
    client: Client,
    config: HttpExecutorConfig,
}

impl HttpExecutor {
    pub fn new(config: HttpExecutorConfig) -> IntegratorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IntegratorError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Backoff configuration for connection retries.
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(self.config.retries as usize)
            .with_jitter()
    }

    fn map_error(&self, err: reqwest::Error) -> IntegratorError {
        if err.is_timeout() {
            IntegratorError::Timeout(self.config.timeout)
        } else {
            IntegratorError::Transport(err.to_string())
        }
    }

    async fn send_once(&self, endpoint: &str, request: &Request) -> Result<Response, reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.into(), endpoint)
            .query(&request.query);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if request.method.has_body() && !request.body.is_null() {
            builder = builder.json(&request.body);
        }

        let reply = builder.send().await?;
        let status = reply.status().as_u16();
        let header_map = reply.headers().clone();
        let bytes = reply.bytes().await?;

        debug!(
            "{} {endpoint} -> {status} ({} bytes)",
            request.method,
            bytes.len()
        );

        Ok(Response {
            status,
            headers: collect_headers(&header_map),
            body: parse_body(&header_map, &bytes),
        })
    }
}

#[async_trait]
impl RequestSender for HttpExecutor {
    async fn send(&self, endpoint: &str, request: &Request) -> IntegratorResult<Response> {
        (|| async { self.send_once(endpoint, request).await })
            .retry(self.backoff())
            .when(|e: &reqwest::Error| e.is_connect())
            .notify(|e: &reqwest::Error, after: Duration| {
                warn!("Connection to {endpoint} failed, retrying in {after:?}: {e}");
            })
            .await
            .map_err(|e| self.map_error(e))
    }
}
