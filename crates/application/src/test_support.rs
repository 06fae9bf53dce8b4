//! Test doubles shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sea_domain::{
    ApiRequest, ApiResponse, AuthError, AuthResponse, AuthSettings, Credentials, TokenPayload,
    User,
};

use crate::auth::TokenStore;
use crate::ports::{
    AuthApi, Clock, CodecError, KeyValueStorage, StorageError, TokenCodec, Transport,
};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Arc<Self> {
        Arc::new(Self {
            now_ms: AtomicI64::new(now_ms),
        })
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let by = i64::try_from(by.as_millis()).unwrap();
        self.now_ms.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst)).unwrap()
    }
}

/// `HashMap` storage that can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct MapStorage {
    values: Mutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
}

impl MapStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }
}

impl KeyValueStorage for MapStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if *self.fail_writes.lock() {
            return Err(StorageError::Io("disk full".into()));
        }
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        if *self.fail_writes.lock() {
            return Err(StorageError::Io("disk full".into()));
        }
        let mut values = self.values.lock();
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}

/// Codec that prefixes `enc:`; anything without the prefix is corrupt.
#[derive(Debug, Default)]
pub struct PrefixCodec;

impl TokenCodec for PrefixCodec {
    fn encode(&self, token: &str) -> String {
        format!("enc:{token}")
    }

    fn decode(&self, stored: &str) -> Result<String, CodecError> {
        stored
            .strip_prefix("enc:")
            .map(str::to_string)
            .ok_or_else(|| CodecError("missing prefix".into()))
    }
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        name: Some(id.to_uppercase()),
        roles: vec!["member".into()],
        avatar: None,
    }
}

pub fn payload(access: &str, refresh: &str, expires_in: u64) -> TokenPayload {
    TokenPayload {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_in: Some(expires_in),
    }
}

/// Scriptable authentication endpoints with call counters.
pub struct MockAuthApi {
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub current_user_calls: AtomicUsize,
    login_result: Mutex<Result<AuthResponse, AuthError>>,
    refresh_result: Mutex<Result<TokenPayload, AuthError>>,
    refresh_delay: Mutex<Duration>,
    logout_delay: Mutex<Duration>,
    logout_result: Mutex<Result<(), AuthError>>,
    current_user_result: Mutex<Result<User, AuthError>>,
    seen_refresh_tokens: Mutex<Vec<String>>,
}

impl MockAuthApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            current_user_calls: AtomicUsize::new(0),
            login_result: Mutex::new(Ok(AuthResponse {
                user: user("ada"),
                tokens: payload("access-1", "refresh-1", 3600),
            })),
            refresh_result: Mutex::new(Ok(payload("access-2", "refresh-2", 3600))),
            refresh_delay: Mutex::new(Duration::ZERO),
            logout_delay: Mutex::new(Duration::ZERO),
            logout_result: Mutex::new(Ok(())),
            current_user_result: Mutex::new(Ok(user("ada"))),
            seen_refresh_tokens: Mutex::new(Vec::new()),
        })
    }

    pub fn set_login(&self, result: Result<AuthResponse, AuthError>) {
        *self.login_result.lock() = result;
    }

    pub fn set_refresh(&self, result: Result<TokenPayload, AuthError>) {
        *self.refresh_result.lock() = result;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock() = delay;
    }

    pub fn set_logout_delay(&self, delay: Duration) {
        *self.logout_delay.lock() = delay;
    }

    pub fn set_logout(&self, result: Result<(), AuthError>) {
        *self.logout_result.lock() = result;
    }

    pub fn set_current_user(&self, result: Result<User, AuthError>) {
        *self.current_user_result.lock() = result;
    }

    pub fn current_user_fetches(&self) -> usize {
        self.current_user_calls.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn seen_refresh_tokens(&self) -> Vec<String> {
        self.seen_refresh_tokens.lock().clone()
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        self.login_result.lock().clone()
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPayload, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_refresh_tokens
            .lock()
            .push(refresh_token.to_string());
        let delay = *self.refresh_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.refresh_result.lock().clone()
    }

    async fn logout(&self, _access_token: Option<&str>) -> Result<(), AuthError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.logout_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.logout_result.lock().clone()
    }

    async fn current_user(&self, _access_token: &str) -> Result<User, AuthError> {
        self.current_user_calls.fetch_add(1, Ordering::SeqCst);
        self.current_user_result.lock().clone()
    }
}

/// Transport that records every request and answers from a script.
///
/// Requests carrying `Bearer <rejected>` get a 401; everything else a 200
/// echoing the bearer token.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<ApiRequest>>,
    rejected_tokens: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_token(&self, token: &str) {
        self.rejected_tokens.lock().push(token.to_string());
    }

    pub fn sent_tokens(&self) -> Vec<Option<String>> {
        self.sent
            .lock()
            .iter()
            .map(|r| r.bearer_token().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AuthError> {
        let token = request.bearer_token().map(str::to_string);
        self.sent.lock().push(request);
        let rejected = token
            .as_ref()
            .is_some_and(|t| self.rejected_tokens.lock().contains(t));
        if rejected {
            return Ok(ApiResponse::json_body(
                401,
                &serde_json::json!({"message": "token revoked"}),
            ));
        }
        Ok(ApiResponse::json_body(
            200,
            &serde_json::json!({"token": token}),
        ))
    }
}

/// Token store over `MapStorage` + `PrefixCodec` with default settings.
pub fn token_store(clock: Arc<ManualClock>) -> (TokenStore, Arc<MapStorage>) {
    let storage = MapStorage::new();
    let store = TokenStore::new(
        storage.clone(),
        Arc::new(PrefixCodec),
        clock,
        &AuthSettings::default(),
    );
    (store, storage)
}
