//! # Upstream Client
//!
//! Opens the single streaming completion request against the
//! OpenAI-compatible backend and hands back the live response body. The
//! body is never buffered here; the caller consumes it chunk by chunk, and
//! dropping the returned stream tears the connection down.

use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use crate::{
    config::Config,
    core::http_client::HttpClientBuilder,
    error::RelayError,
    schemas::CompletionRequest,
};

/// Streaming byte stream from the provider, error-mapped and idle-bounded.
pub type UpstreamByteStream = BoxStream<'static, Result<Bytes, RelayError>>;

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    idle_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(client: Client, base_url: impl Into<String>, idle_timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            idle_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        let client = HttpClientBuilder::from_config(config)
            .build()
            .map_err(|err| RelayError::Internal(format!("failed to build HTTP client: {}", err)))?;
        Ok(Self::new(
            client,
            config.upstream_url.clone(),
            Duration::from_secs(config.stream_idle_timeout_secs),
        ))
    }

    /// Open the streaming completion request.
    ///
    /// The credential travels only in the `Authorization` header. A non-2xx
    /// status is surfaced as [`RelayError::Upstream`] with the (bounded)
    /// error body; nothing is retried here.
    pub async fn open_stream(
        &self,
        request: &CompletionRequest,
        credential: &str,
    ) -> Result<UpstreamByteStream, RelayError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(RelayError::from)?;

        let status = response.status();
        debug!(%status, "upstream responded");

        if !status.is_success() {
            return Err(upstream_failure(status, response).await);
        }

        let idle_timeout = self.idle_timeout;
        let bytes = response
            .bytes_stream()
            .map(|item| item.map_err(RelayError::from));
        let stream = tokio_stream::StreamExt::timeout(bytes, idle_timeout).map(move |item| match item {
            Ok(chunk) => chunk,
            Err(_) => Err(RelayError::Upstream {
                status: None,
                detail: format!(
                    "no data from upstream for {} seconds",
                    idle_timeout.as_secs()
                ),
            }),
        });

        Ok(stream.boxed())
    }
}

/// Capture a bounded slice of the error body for logging.
async fn upstream_failure(status: StatusCode, response: reqwest::Response) -> RelayError {
    let body = response.text().await.unwrap_or_default();
    let detail: String = body.chars().take(2048).collect();
    RelayError::Upstream {
        status: Some(status.as_u16()),
        detail,
    }
}
