//! Request transport port

use async_trait::async_trait;
use sea_domain::{ApiRequest, ApiResponse, AuthError};

/// Sends API requests over the wire.
///
/// Any HTTP status counts as a completed send; only failures to get a
/// response at all (network, timeout) are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and returns the raw response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError>;
}
