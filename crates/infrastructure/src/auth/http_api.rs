//! [`AuthApi`] over a [`Transport`].
//!
//! Requests go straight to the transport. They never pass through the
//! authorized client, so a refresh cannot trigger another refresh.

use std::sync::Arc;

use async_trait::async_trait;
use sea_application::ports::{AuthApi, Transport};
use sea_domain::{
    ApiRequest, ApiSettings, AuthError, AuthResponse, Authorize, Credentials, TokenPayload, User,
};
use serde::Deserialize;
use serde_json::json;

/// Current-user bodies come either wrapped or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum CurrentUserBody {
    Wrapped { user: User },
    Bare(User),
}

impl From<CurrentUserBody> for User {
    fn from(body: CurrentUserBody) -> Self {
        match body {
            CurrentUserBody::Wrapped { user } | CurrentUserBody::Bare(user) => user,
        }
    }
}

/// The backend's auth endpoints, as configured in [`ApiSettings`].
pub struct HttpAuthApi<T> {
    transport: Arc<T>,
    settings: ApiSettings,
}

impl<T: Transport> HttpAuthApi<T> {
    /// Creates the adapter.
    #[must_use]
    pub const fn new(transport: Arc<T>, settings: ApiSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    async fn call<R: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<R, AuthError> {
        self.transport
            .send(request.skip_auth())
            .await?
            .error_for_status()?
            .json()
    }
}

#[async_trait]
impl<T: Transport> AuthApi for HttpAuthApi<T> {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        let request = ApiRequest::post(
            self.settings.login_path.as_str(),
            json!({ "email": credentials.email, "password": credentials.password }),
        );
        self.call(request).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPayload, AuthError> {
        let request = ApiRequest::post(
            self.settings.refresh_path.as_str(),
            json!({ "refreshToken": refresh_token }),
        );
        self.call(request).await
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<(), AuthError> {
        let mut request = ApiRequest::post(self.settings.logout_path.as_str(), json!({}));
        if let Some(token) = access_token {
            request = request.authorize(token);
        }
        self.transport
            .send(request.skip_auth())
            .await?
            .error_for_status()
            .map(|_| ())
    }

    async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let request = ApiRequest::get(self.settings.current_user_path.as_str()).authorize(access_token);
        self.call::<CurrentUserBody>(request).await.map(User::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use sea_domain::ApiResponse;

    struct Canned {
        response: ApiResponse,
        sent: Mutex<Vec<ApiRequest>>,
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
            self.sent.lock().push(request);
            Ok(self.response.clone())
        }
    }

    fn api(status: u16, body: serde_json::Value) -> (HttpAuthApi<Canned>, Arc<Canned>) {
        let transport = Arc::new(Canned {
            response: ApiResponse::json_body(status, &body),
            sent: Mutex::new(Vec::new()),
        });
        (
            HttpAuthApi::new(Arc::clone(&transport), ApiSettings::default()),
            transport,
        )
    }

    #[tokio::test]
    async fn test_current_user_accepts_both_shapes() {
        let user = json!({"id": "u1", "email": "ada@example.com"});

        let (wrapped, transport) = api(200, json!({ "user": user.clone() }));
        assert_eq!(wrapped.current_user("tok").await.unwrap().id, "u1");
        assert_eq!(transport.sent.lock()[0].bearer_token(), Some("tok"));

        let (bare, _) = api(200, user);
        assert_eq!(bare.current_user("tok").await.unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_refresh_sends_refresh_token() {
        let (api, transport) = api(
            200,
            json!({"accessToken": "a2", "refreshToken": "r2", "expiresIn": 60}),
        );
        let tokens = api.refresh("r1").await.unwrap();
        assert_eq!(tokens.access_token, "a2");
        assert_eq!(tokens.expires_in, Some(60));

        let sent = transport.sent.lock();
        assert_eq!(sent[0].path, "/auth/refresh");
        assert_eq!(sent[0].body, Some(json!({"refreshToken": "r1"})));
    }

    #[tokio::test]
    async fn test_login_rejection_maps_to_unauthorized() {
        let (api, _) = api(401, json!({"message": "bad password"}));
        let err = api
            .login(&Credentials::new("ada@example.com", "nope"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::Unauthorized {
                message: "bad password".into()
            }
        );
    }

    #[tokio::test]
    async fn test_logout_without_token_sends_no_header() {
        let (api, transport) = api(204, json!({}));
        api.logout(None).await.unwrap();
        assert_eq!(transport.sent.lock()[0].bearer_token(), None);
    }
}
