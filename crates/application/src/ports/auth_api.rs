//! Authentication endpoints port

use async_trait::async_trait;
use sea_domain::{AuthError, AuthResponse, Credentials, TokenPayload, User};

/// The backend's authentication endpoints.
///
/// Implementations call the endpoints directly and never go through
/// [`AuthorizedClient`](crate::auth::AuthorizedClient), so a refresh can
/// not recurse into request interception.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a user and a token pair.
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError>;

    /// Exchanges a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPayload, AuthError>;

    /// Notifies the server that the session ended. Best effort.
    async fn logout(&self, access_token: Option<&str>) -> Result<(), AuthError>;

    /// Fetches the user the access token belongs to.
    async fn current_user(&self, access_token: &str) -> Result<User, AuthError>;
}
