//! reqwest-backed [`Transport`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method};
use sea_application::ports::Transport;
use sea_domain::{ApiRequest, ApiResponse, ApiSettings, AuthError, HttpMethod};
use url::Url;

use super::{HttpSetupError, base_url, build_client, endpoint, map_error, read_response};

/// Sends API requests with a shared reqwest client.
///
/// Every HTTP status is returned as a response; only failures to get one
/// become errors.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport for the configured API.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be
    /// built.
    pub fn new(settings: &ApiSettings) -> Result<Self, HttpSetupError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: base_url(&settings.base_url)?,
            timeout: settings.request_timeout(),
        })
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    /// The URL relative paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let url = endpoint(&self.base_url, &request.path)?;
        let start = Instant::now();

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_error(&e, self.timeout))?;
        let response = read_response(response, self.timeout).await?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status,
            elapsed_ms = start.elapsed().as_millis(),
            authenticated = request.bearer_token().is_some(),
            "Request completed"
        );
        Ok(response)
    }
}
