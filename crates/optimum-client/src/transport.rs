//! Authenticated HTTP transport.
//!
//! Wraps a `reqwest::Client` bound to the service host. Every request
//! accepts JSON and carries the bearer token, if one is configured.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use optimum_types::{Job, Settings};

use crate::error::ClientError;

/// Transport for signed requests against one service host.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
    token: Option<Arc<SecretString>>,
}

impl Transport {
    /// Create a transport for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token: token.map(Arc::new),
        })
    }

    /// Create a transport from loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Self::new(
            settings.base_url(),
            settings.token.clone().map(SecretString::from),
            settings.request_timeout(),
        )
    }

    /// Service host without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of `path` on the service host.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Status URL of a job.
    ///
    /// The handle may be an absolute URL or a path. Only its path and query
    /// are kept; the request always goes to the configured host.
    pub fn job_url(&self, job: &Job) -> Result<String, ClientError> {
        let handle = job.as_str().trim();
        if handle.is_empty() {
            return Err(ClientError::InvalidJob("empty job handle".to_string()));
        }

        if handle.starts_with("http://") || handle.starts_with("https://") {
            let url = reqwest::Url::parse(handle)
                .map_err(|e| ClientError::InvalidJob(format!("{}: {}", handle, e)))?;
            let path = match url.query() {
                Some(q) => format!("{}?{}", url.path(), q),
                None => url.path().to_string(),
            };
            return Ok(self.url(&path));
        }

        if handle.starts_with('/') {
            Ok(self.url(handle))
        } else {
            Ok(self.url(&format!("/{}", handle)))
        }
    }

    /// Start a request to `url` with the JSON accept header and credentials.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut req = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose_secret());
        }

        req
    }

    /// Send a request and require exactly `expected` as the response status.
    ///
    /// Any other status is turned into `ClientError::Transport` with the
    /// response body as message.
    pub async fn send(
        &self,
        req: RequestBuilder,
        expected: StatusCode,
    ) -> Result<Response, ClientError> {
        let response = req.send().await?;
        let status = response.status();

        if status != expected {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, expected = %expected, "Unexpected response status");
            return Err(ClientError::Transport { status, body });
        }

        Ok(response)
    }
}
