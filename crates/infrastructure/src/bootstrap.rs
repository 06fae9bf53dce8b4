//! Wires the session layer onto the HTTP and storage adapters.

use std::sync::Arc;

use sea_application::ports::{AuthApi, Clock, KeyValueStorage, SessionStore, TokenCodec};
use sea_application::{
    AppStore, AuthorizedClient, NotificationCenter, SessionController, SessionLifecycle,
    TokenRefresher, TokenStore,
};
use sea_domain::SeaSettings;

use crate::adapters::{Base64TokenCodec, SystemClock};
use crate::auth::HttpAuthApi;
use crate::http::{HttpSetupError, ReqwestTransport};

/// Every session component, sharing one token store and one refresher.
pub struct SessionServices {
    /// Loaded settings.
    pub settings: SeaSettings,
    /// Persisted tokens.
    pub tokens: TokenStore,
    /// Single-flight token renewal.
    pub refresher: TokenRefresher,
    /// Observable user and auth flags.
    pub store: AppStore,
    /// Loading indicators and toasts.
    pub notifications: NotificationCenter,
    /// Client for authenticated API calls.
    pub client: AuthorizedClient<ReqwestTransport>,
    /// Login, logout and session checks.
    pub session: SessionController,
}

impl SessionServices {
    /// Builds the services over `storage`.
    ///
    /// # Errors
    /// Returns an error if the API base URL is invalid or the HTTP client
    /// cannot be created.
    pub fn new(
        settings: SeaSettings,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, HttpSetupError> {
        let transport = ReqwestTransport::new(&settings.api)?;
        let codec: Arc<dyn TokenCodec> = Arc::new(Base64TokenCodec);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
        let api: Arc<dyn AuthApi> = Arc::new(HttpAuthApi::new(
            Arc::new(transport.clone()),
            settings.api.clone(),
        ));

        let tokens = TokenStore::new(storage, codec, clock, &settings.auth);
        let refresher = TokenRefresher::new(Arc::clone(&api), tokens.clone(), &settings.auth);
        let store = AppStore::new();
        let notifications = NotificationCenter::new(settings.notifications.clone());

        let session_store: Arc<dyn SessionStore> = Arc::new(store.clone());
        let lifecycle = SessionLifecycle::new(session_store);
        let client = AuthorizedClient::new(
            transport,
            tokens.clone(),
            refresher.clone(),
            lifecycle.clone(),
        );
        let session = SessionController::new(
            api,
            tokens.clone(),
            refresher.clone(),
            lifecycle,
            settings.auth.clone(),
        )
        .with_notifications(notifications.clone());

        tracing::debug!(base_url = %settings.api.base_url, "Session services ready");
        Ok(Self {
            settings,
            tokens,
            refresher,
            store,
            notifications,
            client,
            session,
        })
    }
}
