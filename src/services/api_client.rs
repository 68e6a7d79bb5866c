//! Authenticated request client for Markstash.
//!
//! Every outbound request picks up the current bearer token from the session.
//! When a request to a non-auth endpoint comes back 401 and has not been
//! retried yet, the client runs a single-flight refresh:
//!
//! - if a refresh is already in flight the request queues behind it;
//! - otherwise it becomes the refresher: it sets the refreshing flag and calls
//!   `GET /auth/check-status` directly on the transport with the current token;
//! - on success the new token is stored via `login`, queued requests are
//!   released with it, and the original request is resubmitted;
//! - on failure queued requests get the refresh error, the session is torn
//!   down via `logout` and the client is sent to the landing route.
//!
//! The flag is cleared before the protocol returns, whatever the outcome.
//! Flag check-and-set happens under one lock with no `.await` in between, so
//! two failing requests can never both become the refresher.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::managers::bookmark_store::BookmarkStore;
use crate::types::errors::ApiError;
use crate::types::session::Session;
use crate::types::settings::ClientSettings;

/// Endpoint that exchanges the current token for a fresh one.
pub const CHECK_STATUS_PATH: &str = "/auth/check-status";

/// Endpoint that creates an account and returns a token.
pub const REGISTER_PATH: &str = "/auth/register";

const AUTH_PREFIX: &str = "/auth/";

/// An outbound request, relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// Bearer token attached when the request goes out.
    pub bearer: Option<String>,
    /// Set once the request has been through a refresh cycle.
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    /// Auth endpoints never trigger a refresh.
    pub fn is_auth_endpoint(&self) -> bool {
        self.path.starts_with(AUTH_PREFIX)
    }
}

/// A response with its decoded JSON body (`Null` when empty).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Best-effort error message from a `{ "message": ... }` body.
    fn message(&self) -> String {
        match &self.body {
            Value::Object(map) => map
                .get("message")
                .map(|m| match m {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| self.body.to_string()),
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    pub fn into_error(self) -> ApiError {
        if self.is_unauthorized() {
            ApiError::Unauthorized(self.message())
        } else {
            ApiError::Http {
                status: self.status,
                message: self.message(),
            }
        }
    }

    /// Reads the `token` field returned by the auth endpoints.
    pub fn token(&self) -> Result<String, ApiError> {
        self.body
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode("response has no token".to_string()))
    }
}

/// Sends one request and returns whatever the server answered.
///
/// Non-success statuses are `Ok`; only failures to get a response are `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// HTTP transport over `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method.clone(), &url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        debug!(method = %request.method, path = %request.path, status, "API response");
        Ok(ApiResponse { status, body })
    }
}

/// Read and write access to the session the client authenticates with.
pub trait SessionAccess: Send + Sync {
    /// Point-in-time snapshot of the session.
    fn session(&self) -> Session;
    fn login(&self, token: &str);
    fn logout(&self);

    fn token(&self) -> Option<String> {
        self.session().token
    }
}

fn lock_store(store: &Mutex<BookmarkStore>) -> MutexGuard<'_, BookmarkStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionAccess for Mutex<BookmarkStore> {
    fn session(&self) -> Session {
        lock_store(self).session()
    }

    fn login(&self, token: &str) {
        lock_store(self).login(token);
    }

    fn logout(&self) {
        lock_store(self).logout();
    }
}

/// Where the client currently is, and how to send it elsewhere.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;
    fn redirect(&self, route: &str);
}

/// In-process route holder used when no UI router is attached.
pub struct RouteState {
    route: Mutex<String>,
}

impl RouteState {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            route: Mutex::new(initial.into()),
        }
    }
}

impl Navigator for RouteState {
    fn current_route(&self) -> String {
        self.route
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn redirect(&self, route: &str) {
        *self.route.lock().unwrap_or_else(PoisonError::into_inner) = route.to_string();
    }
}

type RefreshOutcome = Result<String, ApiError>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// Clears the refreshing flag if a refresher is dropped mid-flight, so
/// queued requests fail instead of waiting forever.
struct RefreshGuard<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.refreshing = false;
            state.waiters.clear();
        }
    }
}

/// Request client with bearer injection and single-flight token refresh.
pub struct AuthClient {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionAccess>,
    navigator: Arc<dyn Navigator>,
    landing_route: String,
    refresh: Mutex<RefreshState>,
}

impl AuthClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionAccess>,
        navigator: Arc<dyn Navigator>,
        landing_route: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            session,
            navigator,
            landing_route: landing_route.into(),
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    /// Builds a client over HTTP using `settings`.
    pub fn from_settings(
        settings: &ClientSettings,
        session: Arc<dyn SessionAccess>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let transport = Arc::new(ReqwestTransport::new(settings)?);
        Ok(Self::new(
            transport,
            session,
            navigator,
            settings.landing_route.clone(),
        ))
    }

    /// Whether a refresh cycle is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_state().refreshing
    }

    fn refresh_state(&self) -> MutexGuard<'_, RefreshState> {
        self.refresh.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends `request` with the current token, recovering from a 401 via the
    /// refresh protocol when allowed.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        request.bearer = self.session.token();
        let response = self.transport.send(&request).await?;
        if response.is_success() {
            return Ok(response);
        }
        if response.is_unauthorized() && !request.retried && !request.is_auth_endpoint() {
            return self.recover(request).await;
        }
        Err(response.into_error())
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::get(path)).await?.body)
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::post(path, body)).await?.body)
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::put(path, body)).await?.body)
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        Ok(self.send(ApiRequest::delete(path)).await?.body)
    }

    async fn recover(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        request.retried = true;

        let waiter = {
            let mut state = self.refresh_state();
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        let token = match waiter {
            Some(rx) => {
                debug!(path = %request.path, "Queued behind in-flight token refresh");
                rx.await.map_err(|_| {
                    ApiError::RefreshFailed("refresh was abandoned".to_string())
                })??
            }
            None => self.run_refresh().await?,
        };

        request.bearer = Some(token);
        let response = self.transport.send(&request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(response.into_error())
        }
    }

    /// Runs one refresh cycle. Only the request that set the flag gets here.
    async fn run_refresh(&self) -> RefreshOutcome {
        let mut guard = RefreshGuard {
            state: &self.refresh,
            armed: true,
        };

        let current = self.session.token();
        let outcome = match self
            .transport
            .send(&ApiRequest::get(CHECK_STATUS_PATH).with_bearer(current))
            .await
        {
            Ok(response) if response.is_success() => response.token(),
            Ok(response) => Err(response.into_error()),
            Err(e) => Err(e),
        }
        .map_err(|e| ApiError::RefreshFailed(e.to_string()));

        if let Ok(token) = &outcome {
            self.session.login(token);
        }

        let waiters = {
            let mut state = self.refresh_state();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        guard.armed = false;

        match &outcome {
            Ok(_) => info!(queued = waiters.len(), "Token refreshed"),
            Err(e) => warn!(queued = waiters.len(), error = %e, "Token refresh failed"),
        }
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        if outcome.is_err() {
            self.session.logout();
            if self.navigator.current_route() != self.landing_route {
                self.navigator.redirect(&self.landing_route);
            }
        }

        outcome
    }
}
