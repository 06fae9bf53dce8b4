//! HTTP plumbing on top of reqwest.
//!
//! - [`ReqwestTransport`] sends [`ApiRequest`](sea_domain::ApiRequest)s
//! - [`endpoint`] resolves API paths against the configured base URL
//! - [`map_error`] turns reqwest failures into [`AuthError`]s

mod transport;

pub use transport::ReqwestTransport;

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use sea_domain::{ApiResponse, ApiSettings, AuthError};
use thiserror::Error;
use url::Url;

const USER_AGENT: &str = concat!("sea/", env!("CARGO_PKG_VERSION"));

/// Errors raised while setting up the HTTP layer.
#[derive(Debug, Error)]
pub enum HttpSetupError {
    /// The configured base URL does not parse.
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl {
        /// The rejected value.
        url: String,
        /// Parser message.
        message: String,
    },

    /// reqwest refused the client configuration.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Builds the shared reqwest client.
///
/// # Errors
/// Returns `HttpSetupError::Client` if the TLS backend cannot initialize.
pub fn build_client(settings: &ApiSettings) -> Result<Client, HttpSetupError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(settings.request_timeout())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| HttpSetupError::Client(e.to_string()))
}

/// Parses the base URL so relative paths append to it.
///
/// # Errors
/// Returns `HttpSetupError::InvalidBaseUrl` if `raw` is not an absolute URL.
pub fn base_url(raw: &str) -> Result<Url, HttpSetupError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| HttpSetupError::InvalidBaseUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolves `path` against `base`. Absolute URLs are used as-is.
///
/// # Errors
/// Returns `AuthError::Network` if the result is not a valid URL.
pub fn endpoint(base: &Url, path: &str) -> Result<Url, AuthError> {
    if path.contains("://") {
        return Url::parse(path).map_err(|e| AuthError::Network {
            message: format!("invalid URL '{path}': {e}"),
        });
    }
    base.join(path.trim_start_matches('/'))
        .map_err(|e| AuthError::Network {
            message: format!("invalid path '{path}': {e}"),
        })
}

/// Maps a reqwest failure onto the session error model.
#[must_use]
pub fn map_error(error: &reqwest::Error, timeout: Duration) -> AuthError {
    if error.is_timeout() {
        return AuthError::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        };
    }
    if error.is_decode() || error.is_body() {
        return AuthError::InvalidResponse {
            message: error.to_string(),
        };
    }
    AuthError::Network {
        message: error.to_string(),
    }
}

/// Reads a reqwest response into an [`ApiResponse`].
///
/// # Errors
/// Returns an error if the body cannot be read.
pub async fn read_response(
    response: reqwest::Response,
    timeout: Duration,
) -> Result<ApiResponse, AuthError> {
    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .bytes()
        .await
        .map_err(|e| map_error(&e, timeout))?
        .to_vec();
    Ok(ApiResponse::new(status, headers, body))
}
