//! Unit tests for the authenticated request client.
//!
//! A scripted in-process transport stands in for the API. It accepts only the
//! token it considers valid, answers `/auth/check-status` with a configured
//! outcome, and can hold the refresh call back until a given number of
//! requests have been rejected, so several failures overlap one refresh.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use markstash::managers::bookmark_store::BookmarkStore;
use markstash::services::api_client::{
    ApiRequest, ApiResponse, AuthClient, Navigator, RouteState, SessionAccess, Transport,
    CHECK_STATUS_PATH,
};
use markstash::types::errors::ApiError;
use markstash::types::settings::ClientSettings;
use reqwest::Method;
use serde_json::{json, Value};

struct ScriptedTransport {
    valid_token: String,
    refresh_result: Option<String>,
    hold_refresh_until: usize,
    requests: Mutex<Vec<ApiRequest>>,
    refresh_calls: AtomicUsize,
    rejected: AtomicUsize,
}

impl ScriptedTransport {
    fn new(valid_token: &str, refresh_result: Option<&str>) -> Self {
        Self {
            valid_token: valid_token.to_string(),
            refresh_result: refresh_result.map(str::to_string),
            hold_refresh_until: 0,
            requests: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        }
    }

    fn holding_refresh_until(mut self, rejected: usize) -> Self {
        self.hold_refresh_until = rejected;
        self
    }

    fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;

        if request.path == CHECK_STATUS_PATH {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            while self.rejected.load(Ordering::SeqCst) < self.hold_refresh_until {
                tokio::task::yield_now().await;
            }
            return Ok(match &self.refresh_result {
                Some(token) => ApiResponse::new(200, json!({ "token": token })),
                None => ApiResponse::new(401, json!({ "message": "Session expired" })),
            });
        }

        if request.path == "/offline" {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        if request.path == "/missing" {
            return Ok(ApiResponse::new(404, json!({ "message": "Not found" })));
        }
        if request.bearer.as_deref() == Some(self.valid_token.as_str()) {
            return Ok(ApiResponse::new(
                200,
                json!({ "path": request.path, "body": request.body }),
            ));
        }

        self.rejected.fetch_add(1, Ordering::SeqCst);
        Ok(ApiResponse::new(401, json!({ "message": "Unauthorized" })))
    }
}

struct Harness {
    transport: Arc<ScriptedTransport>,
    store: Arc<Mutex<BookmarkStore>>,
    navigator: Arc<RouteState>,
    client: AuthClient,
}

fn harness(transport: ScriptedTransport, token: Option<&str>, route: &str) -> Harness {
    let transport = Arc::new(transport);
    let mut store = BookmarkStore::new();
    if let Some(token) = token {
        store.login(token);
    }
    let store = Arc::new(Mutex::new(store));
    let navigator = Arc::new(RouteState::new(route));
    let client = AuthClient::new(
        transport.clone(),
        store.clone() as Arc<dyn SessionAccess>,
        navigator.clone() as Arc<dyn Navigator>,
        "/",
    );
    Harness {
        transport,
        store,
        navigator,
        client,
    }
}

fn token_of(store: &Mutex<BookmarkStore>) -> Option<String> {
    store.lock().unwrap().token()
}

// ─── Request augmentation ───

#[tokio::test]
async fn test_bearer_comes_from_session() {
    let h = harness(ScriptedTransport::new("good", None), Some("good"), "/");

    let body = h.client.get("/bookmarks").await.unwrap();
    assert_eq!(body["path"], "/bookmarks");

    let sent = h.transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].bearer.as_deref(), Some("good"));
    assert_eq!(sent[0].method, Method::GET);
    assert_eq!(h.transport.refresh_calls(), 0);
}

#[tokio::test]
async fn test_guest_requests_carry_no_bearer() {
    let h = harness(ScriptedTransport::new("good", None), None, "/");
    let _ = h.client.get("/public").await;
    assert!(h.transport.requests()[0].bearer.is_none());
}

#[tokio::test]
async fn test_verbs_send_bodies() {
    let h = harness(ScriptedTransport::new("good", None), Some("good"), "/");

    let posted = h.client.post("/items", json!({"a": 1})).await.unwrap();
    assert_eq!(posted["body"], json!({"a": 1}));
    let put = h.client.put("/items/1", json!({"a": 2})).await.unwrap();
    assert_eq!(put["body"], json!({"a": 2}));
    let deleted = h.client.delete("/items/1").await.unwrap();
    assert_eq!(deleted["body"], Value::Null);

    let methods: Vec<Method> = h.transport.requests().into_iter().map(|r| r.method).collect();
    assert_eq!(methods, vec![Method::POST, Method::PUT, Method::DELETE]);
}

#[tokio::test]
async fn test_non_auth_errors_pass_through() {
    let h = harness(ScriptedTransport::new("good", None), Some("good"), "/");

    let err = h.client.get("/missing").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            status: 404,
            message: "Not found".to_string()
        }
    );

    let err = h.client.get("/offline").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(h.transport.refresh_calls(), 0);
}

// ─── Refresh protocol ───

#[tokio::test]
async fn test_401_refreshes_and_retries_once() {
    let h = harness(
        ScriptedTransport::new("fresh", Some("fresh")),
        Some("stale"),
        "/bookmarks",
    );

    let body = h.client.get("/bookmarks").await.unwrap();
    assert_eq!(body["path"], "/bookmarks");
    assert_eq!(h.transport.refresh_calls(), 1);
    assert_eq!(token_of(&h.store).as_deref(), Some("fresh"));
    assert!(!h.client.is_refreshing());

    let sent = h.transport.requests();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1].path, CHECK_STATUS_PATH);
    assert_eq!(sent[1].bearer.as_deref(), Some("stale"), "refresh uses the current token");
    assert!(sent[2].retried);
    assert_eq!(sent[2].bearer.as_deref(), Some("fresh"));
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let transport = ScriptedTransport::new("fresh", Some("fresh")).holding_refresh_until(3);
    let h = harness(transport, Some("stale"), "/bookmarks");

    let (a, b, c) = tokio::join!(
        h.client.get("/a"),
        h.client.get("/b"),
        h.client.get("/c"),
    );

    assert_eq!(a.unwrap()["path"], "/a");
    assert_eq!(b.unwrap()["path"], "/b");
    assert_eq!(c.unwrap()["path"], "/c");
    assert_eq!(h.transport.refresh_calls(), 1, "exactly one refresh");
    assert_eq!(token_of(&h.store).as_deref(), Some("fresh"));
    assert!(!h.client.is_refreshing());
}

#[tokio::test]
async fn test_failed_refresh_rejects_everyone_and_logs_out() {
    let transport = ScriptedTransport::new("never", None).holding_refresh_until(3);
    let h = harness(transport, Some("stale"), "/bookmarks");

    let (a, b, c) = tokio::join!(
        h.client.get("/a"),
        h.client.get("/b"),
        h.client.get("/c"),
    );

    for result in [a, b, c] {
        assert!(
            matches!(result, Err(ApiError::RefreshFailed(_))),
            "queued and refreshing requests get the refresh error: {:?}",
            result
        );
    }
    assert_eq!(h.transport.refresh_calls(), 1);
    assert!(token_of(&h.store).is_none());
    assert!(!h.store.lock().unwrap().session().is_authenticated());
    assert_eq!(h.navigator.current_route(), "/");
    assert!(!h.client.is_refreshing());
}

#[tokio::test]
async fn test_failed_refresh_on_landing_route_does_not_redirect() {
    struct RecordingNavigator {
        redirects: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn current_route(&self) -> String {
            "/".to_string()
        }

        fn redirect(&self, route: &str) {
            self.redirects.lock().unwrap().push(route.to_string());
        }
    }

    let transport = Arc::new(ScriptedTransport::new("never", None));
    let store = Arc::new(Mutex::new(BookmarkStore::new()));
    store.lock().unwrap().login("stale");
    let navigator = Arc::new(RecordingNavigator {
        redirects: Mutex::new(Vec::new()),
    });
    let client = AuthClient::new(
        transport,
        store.clone() as Arc<dyn SessionAccess>,
        navigator.clone() as Arc<dyn Navigator>,
        "/",
    );

    assert!(client.get("/x").await.is_err());
    assert!(navigator.redirects.lock().unwrap().is_empty());
    assert!(token_of(&store).is_none());
}

#[tokio::test]
async fn test_auth_endpoints_never_trigger_refresh() {
    let h = harness(ScriptedTransport::new("good", Some("good")), Some("stale"), "/");

    let err = h
        .client
        .send(ApiRequest::post("/auth/login", json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(err.status(), Some(401));
    assert_eq!(h.transport.refresh_calls(), 0);
    assert_eq!(token_of(&h.store).as_deref(), Some("stale"));
}

#[tokio::test]
async fn test_retried_request_is_not_refreshed_again() {
    // The refresh hands out a token the API still rejects.
    let h = harness(
        ScriptedTransport::new("good", Some("also-bad")),
        Some("stale"),
        "/",
    );

    let err = h.client.get("/bookmarks").await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(h.transport.refresh_calls(), 1);

    let mut already_retried = ApiRequest::get("/bookmarks");
    already_retried.retried = true;
    let err = h.client.send(already_retried).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert_eq!(h.transport.refresh_calls(), 1);
}

// ─── Construction ───

#[test]
fn test_request_builders() {
    let req = ApiRequest::put("/items/1", json!({"x": true})).with_bearer(Some("t".into()));
    assert_eq!(req.method, Method::PUT);
    assert_eq!(req.body, Some(json!({"x": true})));
    assert_eq!(req.bearer.as_deref(), Some("t"));
    assert!(!req.retried);
    assert!(ApiRequest::get(CHECK_STATUS_PATH).is_auth_endpoint());
    assert!(!ApiRequest::get("/authors").is_auth_endpoint());
}

#[test]
fn test_response_token_and_errors() {
    assert_eq!(
        ApiResponse::new(200, json!({"token": "abc"})).token().unwrap(),
        "abc"
    );
    assert!(matches!(
        ApiResponse::new(200, json!({})).token(),
        Err(ApiError::Decode(_))
    ));
    assert_eq!(
        ApiResponse::new(500, json!("boom")).into_error(),
        ApiError::Http {
            status: 500,
            message: "boom".to_string()
        }
    );
}

#[test]
fn test_from_settings_builds_http_client() {
    let store = Arc::new(Mutex::new(BookmarkStore::new()));
    let client = AuthClient::from_settings(
        &ClientSettings::default(),
        store as Arc<dyn SessionAccess>,
        Arc::new(RouteState::new("/")) as Arc<dyn Navigator>,
    );
    assert!(client.is_ok());
}
