//! HTTP client for the Inkpost platform API.
//!
//! `ApiClient` owns the request pipeline: every call attaches the current
//! access token, sends, and watches the response for authentication
//! failures. On one, it refreshes through the shared `TokenManager` and
//! retries the request exactly once with the new token. Terminal failures
//! clear credentials and, policy permitting, broadcast a sign-in-required
//! event for the application to act on.

use std::sync::Arc;

use reqwest::{multipart, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenManager;
use crate::config::ClientConfig;

use super::error;
use super::ApiError;

// ============================================================================
// Request policy
// ============================================================================

/// What to do when a request fails authentication terminally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureAction {
    /// Clear credentials and broadcast `AuthEvent::SignInRequired`.
    Redirect,
    /// Clear credentials but stay quiet; the caller shows its own notice.
    Notify,
}

/// Per-request behavior on authentication failure, derived from the
/// request path against `ClientConfig::notice_paths`.
#[derive(Debug, Clone, Copy)]
pub struct RequestPolicy {
    pub retry_on_auth_failure: bool,
    pub on_auth_failure: AuthFailureAction,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            retry_on_auth_failure: true,
            on_auth_failure: AuthFailureAction::Redirect,
        }
    }
}

// ============================================================================
// Request description
// ============================================================================

/// A multipart file upload, kept as raw parts so the form can be rebuilt
/// for the auth retry.
#[derive(Debug, Clone)]
pub(super) struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
enum RequestBody {
    None,
    Json(Value),
    File(FilePart),
}

/// A rebuildable description of one API call. reqwest consumes its
/// builder on send, and a retry needs a second identical request.
pub(super) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    policy: RequestPolicy,
}

impl ApiRequest {
    fn new(method: Method, path: &str, policy: RequestPolicy) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: Vec::new(),
            body: RequestBody::None,
            policy,
        }
    }

    pub(super) fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub(super) fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub(super) fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub(super) fn file(mut self, part: FilePart) -> Self {
        self.body = RequestBody::File(part);
        self
    }

    /// Opt out of the refresh-and-retry cycle. Used on endpoints where a
    /// 401 means the request itself was wrong (bad password, dead reset
    /// link), not that our token aged out.
    pub(super) fn no_retry(mut self) -> Self {
        self.policy.retry_on_auth_failure = false;
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for the Inkpost backend.
/// Clone is cheap - reqwest::Client pools connections behind an Arc, and
/// the token manager is a shared handle.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Arc<ClientConfig>,
    tokens: TokenManager,
}

impl ApiClient {
    pub fn new(config: ClientConfig, tokens: TokenManager) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
            tokens,
        })
    }

    /// The shared credential store behind this client.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(super) fn request(&self, method: Method, path: &str) -> ApiRequest {
        ApiRequest::new(method, path, self.policy_for(path))
    }

    fn policy_for(&self, path: &str) -> RequestPolicy {
        if self.config.is_notice_path(path) {
            RequestPolicy {
                retry_on_auth_failure: true,
                on_auth_failure: AuthFailureAction::Notify,
            }
        } else {
            RequestPolicy::default()
        }
    }

    /// Send a request through the pipeline and decode its JSON body.
    pub(super) async fn request_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.execute(request).await?;
        response.json().await.map_err(|err| {
            warn!(path = %path, error = %err, "Response body did not match the expected shape");
            ApiError::InvalidResponse(err.to_string())
        })
    }

    /// Send a request through the pipeline, discarding the response body.
    pub(super) async fn request_unit(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(request).await?;
        Ok(())
    }

    /// The pipeline. One send; on an auth failure, one refresh and one
    /// retry; never more.
    async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let attached = self.tokens.access_token();
        let response = self.send_once(&request, attached.as_deref()).await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Transport errors never reach here (they surface from send_once);
        // everything else is classified by status and body text.
        if !error::is_auth_failure(status, &body) {
            return Err(ApiError::from_status(status, &body));
        }

        let had_session = attached.is_some() || self.tokens.refresh_token().is_some();
        if !request.policy.retry_on_auth_failure || self.tokens.refresh_token().is_none() {
            debug!(path = %request.path, %status, "Terminal auth failure without retry");
            if had_session {
                self.tokens.clear();
                self.signal_auth_failure(&request.policy);
            }
            return Err(ApiError::Unauthorized(error::short_detail(&body)));
        }

        // The server refused the token we attached, so the refresh path
        // must treat it as stale no matter what its local expiry says.
        let fresh = match self.tokens.fresh_access_token(attached.as_deref()).await {
            Ok(token) => token,
            Err(err) => {
                // The failed refresh already cleared credentials.
                self.signal_auth_failure(&request.policy);
                return Err(err.into());
            }
        };

        debug!(path = %request.path, "Retrying once with a refreshed token");
        let retry = self.send_once(&request, Some(&fresh)).await?;
        if retry.status().is_success() {
            return Ok(retry);
        }

        let retry_status = retry.status();
        let retry_body = retry.text().await.unwrap_or_default();
        if error::is_auth_failure(retry_status, &retry_body) {
            warn!(
                path = %request.path,
                status = %retry_status,
                "Refreshed token was rejected; signing out"
            );
            self.tokens.clear();
            self.signal_auth_failure(&request.policy);
            return Err(ApiError::SessionExpired);
        }
        Err(ApiError::from_status(retry_status, &retry_body))
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let url = self.config.endpoint(&request.path);
        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::File(part) => {
                let file = multipart::Part::bytes(part.data.clone())
                    .file_name(part.file_name.clone())
                    .mime_str(&part.content_type)
                    .map_err(|err| {
                        ApiError::InvalidResponse(format!(
                            "Invalid upload content type '{}': {}",
                            part.content_type, err
                        ))
                    })?;
                builder.multipart(multipart::Form::new().part(part.field.clone(), file))
            }
        };

        Ok(builder.send().await?)
    }

    fn signal_auth_failure(&self, policy: &RequestPolicy) {
        if policy.on_auth_failure == AuthFailureAction::Redirect {
            self.tokens.signal_sign_in_required();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::{any, post};
    use axum::Router;
    use chrono::Duration;
    use futures::future::join_all;
    use tokio::net::TcpListener;
    use tokio::sync::broadcast::error::TryRecvError;

    use crate::auth::claims::{self, test_jwt};
    use crate::auth::{AuthEvent, TokenPair};

    use super::*;

    struct MockBackend {
        addr: SocketAddr,
        refresh_calls: Arc<AtomicU32>,
        protected_calls: Arc<AtomicU32>,
        public_saw_auth: Arc<AtomicBool>,
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
            .map(str::to_string)
    }

    /// Start a mock backend:
    /// - POST /auth/refresh returns `refresh_responses` in order,
    /// - /protected (any method) accepts any unexpired bearer token and
    ///   otherwise answers with `failure`; `reject_all` refuses even good
    ///   tokens,
    /// - GET /public always succeeds and records whether auth was sent.
    async fn mock_backend(
        refresh_responses: Vec<(u16, String)>,
        failure: (u16, String),
        reject_all: bool,
    ) -> MockBackend {
        let refresh_calls = Arc::new(AtomicU32::new(0));
        let protected_calls = Arc::new(AtomicU32::new(0));
        let public_saw_auth = Arc::new(AtomicBool::new(false));
        let responses = Arc::new(refresh_responses);

        let refresh_counter = Arc::clone(&refresh_calls);
        let refresh_route = post(move |_body: String| {
            let count = Arc::clone(&refresh_counter);
            let resps = Arc::clone(&responses);
            async move {
                let idx = count.fetch_add(1, Ordering::Relaxed) as usize;
                let (status, body) = if idx < resps.len() {
                    resps[idx].clone()
                } else {
                    resps.last().cloned().unwrap_or((500, "{}".to_owned()))
                };
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    body,
                )
            }
        });

        let protected_counter = Arc::clone(&protected_calls);
        let protected_route = any(move |headers: HeaderMap| {
            let count = Arc::clone(&protected_counter);
            let failure = failure.clone();
            async move {
                count.fetch_add(1, Ordering::Relaxed);
                let authorized = !reject_all
                    && bearer(&headers).is_some_and(|token| !claims::is_expired(&token));
                if authorized {
                    (StatusCode::OK, r#"{"ok": true}"#.to_owned())
                } else {
                    (
                        StatusCode::from_u16(failure.0)
                            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                        failure.1.clone(),
                    )
                }
            }
        });

        let seen = Arc::clone(&public_saw_auth);
        let public_route = any(move |headers: HeaderMap| {
            let seen = Arc::clone(&seen);
            async move {
                if headers.contains_key(header::AUTHORIZATION) {
                    seen.store(true, Ordering::Relaxed);
                }
                (StatusCode::OK, r#"{"ok": true}"#.to_owned())
            }
        });

        let app = Router::new()
            .route("/auth/refresh", refresh_route)
            .route("/protected", protected_route)
            .route("/public", public_route);

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        MockBackend {
            addr,
            refresh_calls,
            protected_calls,
            public_saw_auth,
        }
    }

    fn unauthorized_body() -> (u16, String) {
        (401, r#"{"detail": "Could not validate credentials"}"#.to_owned())
    }

    fn rotated_pair_body() -> String {
        serde_json::json!({
            "access_token": test_jwt(Duration::minutes(31), "access"),
            "refresh_token": test_jwt(Duration::days(7), "refresh"),
            "token_type": "bearer",
        })
        .to_string()
    }

    fn expired_pair() -> TokenPair {
        TokenPair {
            access_token: test_jwt(Duration::seconds(-60), "access"),
            refresh_token: test_jwt(Duration::days(6), "refresh"),
        }
    }

    fn fresh_pair() -> TokenPair {
        TokenPair {
            access_token: test_jwt(Duration::minutes(30), "access"),
            refresh_token: test_jwt(Duration::days(6), "refresh"),
        }
    }

    fn test_client(
        addr: SocketAddr,
        dir: &tempfile::TempDir,
        notice_paths: Vec<String>,
    ) -> ApiClient {
        let mut config = ClientConfig::default();
        config.base_url = format!("http://{addr}");
        config.token_file = Some(dir.path().join("tokens.json"));
        config.expiry_check_interval_secs = 3600;
        config.refresh_health_interval_secs = 3600;
        config.notice_paths = notice_paths;
        let tokens = TokenManager::new(&config).expect("manager");
        ApiClient::new(config, tokens).expect("client")
    }

    #[tokio::test]
    async fn fresh_token_is_attached_and_accepted() {
        let backend = mock_backend(vec![], unauthorized_body(), false).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        client.tokens().store(fresh_pair());

        let value: Value = client
            .request_json(client.request(Method::GET, "/protected"))
            .await
            .expect("response");
        assert_eq!(value["ok"], true);
        assert_eq!(backend.protected_calls.load(Ordering::Relaxed), 1);
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn anonymous_requests_go_out_bare() {
        let backend = mock_backend(vec![], unauthorized_body(), false).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);

        let value: Value = client
            .request_json(client.request(Method::GET, "/public"))
            .await
            .expect("response");
        assert_eq!(value["ok"], true);
        assert!(!backend.public_saw_auth.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn expired_token_refreshes_and_retries_once() {
        let backend =
            mock_backend(vec![(200, rotated_pair_body())], unauthorized_body(), false).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        let mut events = client.tokens().subscribe();
        client.tokens().store(expired_pair());

        let value: Value = client
            .request_json(client.request(Method::GET, "/protected"))
            .await
            .expect("response after refresh");
        assert_eq!(value["ok"], true);

        assert_eq!(backend.protected_calls.load(Ordering::Relaxed), 2);
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
        assert!(matches!(events.try_recv(), Ok(AuthEvent::Refreshed)));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_refresh() {
        let backend =
            mock_backend(vec![(200, rotated_pair_body())], unauthorized_body(), false).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        client.tokens().store(expired_pair());

        let requests: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move {
                    client
                        .request_json::<Value>(client.request(Method::GET, "/protected"))
                        .await
                })
            })
            .collect();

        for joined in join_all(requests).await {
            let value = joined.expect("task").expect("response");
            assert_eq!(value["ok"], true);
        }
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
        // At most one retry per request, however the sends interleaved.
        let sends = backend.protected_calls.load(Ordering::Relaxed);
        assert!((8..=16).contains(&sends), "unexpected send count {sends}");
    }

    #[tokio::test]
    async fn dead_session_clears_and_signals_sign_in() {
        let backend = mock_backend(
            vec![(401, r#"{"detail": "Invalid refresh token"}"#.to_owned())],
            unauthorized_body(),
            false,
        )
        .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        let mut events = client.tokens().subscribe();
        client.tokens().store(expired_pair());

        let result = client
            .request_json::<Value>(client.request(Method::GET, "/protected"))
            .await;
        assert!(matches!(result, Err(ApiError::SessionExpired)));

        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
        assert!(!client.tokens().has_valid_tokens());
        assert!(matches!(events.try_recv(), Ok(AuthEvent::SignInRequired)));
    }

    #[tokio::test]
    async fn rejected_retry_is_terminal_after_exactly_two_sends() {
        // Refresh succeeds, but the backend refuses even the new token.
        let backend =
            mock_backend(vec![(200, rotated_pair_body())], unauthorized_body(), true).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        let mut events = client.tokens().subscribe();
        client.tokens().store(expired_pair());

        let result = client
            .request_json::<Value>(client.request(Method::GET, "/protected"))
            .await;
        assert!(matches!(result, Err(ApiError::SessionExpired)));

        // One refresh, two sends, no second cycle.
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
        assert_eq!(backend.protected_calls.load(Ordering::Relaxed), 2);
        assert_eq!(client.tokens().token_pair(), None);
        // Refreshed fired for the successful rotation, then the terminal
        // failure demanded a sign-in.
        assert!(matches!(events.try_recv(), Ok(AuthEvent::Refreshed)));
        assert!(matches!(events.try_recv(), Ok(AuthEvent::SignInRequired)));
    }

    #[tokio::test]
    async fn notice_paths_stay_quiet_on_terminal_failure() {
        let backend =
            mock_backend(vec![(200, rotated_pair_body())], unauthorized_body(), true).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec!["/protected".to_owned()]);
        let mut events = client.tokens().subscribe();
        client.tokens().store(expired_pair());

        let result = client
            .request_json::<Value>(client.request(Method::POST, "/protected"))
            .await;
        assert!(matches!(result, Err(ApiError::SessionExpired)));

        // Credentials are gone either way, but nobody is redirected.
        assert_eq!(client.tokens().token_pair(), None);
        assert!(matches!(events.try_recv(), Ok(AuthEvent::Refreshed)));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn disguised_500_auth_failure_still_recovers() {
        let backend = mock_backend(
            vec![(200, rotated_pair_body())],
            (500, r#"{"detail": "Token has expired"}"#.to_owned()),
            false,
        )
        .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        client.tokens().store(expired_pair());

        let value: Value = client
            .request_json(client.request(Method::GET, "/protected"))
            .await
            .expect("response after refresh");
        assert_eq!(value["ok"], true);
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn plain_500_passes_through_without_refresh() {
        let backend = mock_backend(
            vec![(200, rotated_pair_body())],
            (500, r#"{"detail": "database exploded"}"#.to_owned()),
            false,
        )
        .await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        client.tokens().store(expired_pair());

        let result = client
            .request_json::<Value>(client.request(Method::GET, "/protected"))
            .await;
        assert!(matches!(result, Err(ApiError::ServerError { status: 500, .. })));
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 0);
        // The session is untouched; this was not an auth problem.
        assert!(client.tokens().has_valid_tokens());
    }

    #[tokio::test]
    async fn network_errors_pass_through_untouched() {
        // Bind a port and drop the listener so connections are refused.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(addr, &dir, vec![]);
        client.tokens().store(fresh_pair());

        let result = client
            .request_json::<Value>(client.request(Method::GET, "/protected"))
            .await;
        assert!(matches!(result, Err(ApiError::NetworkError(_))));
        // Transport trouble is not an auth failure; nothing was cleared.
        assert!(client.tokens().has_valid_tokens());
    }

    #[tokio::test]
    async fn anonymous_401_does_not_clear_or_signal() {
        let backend = mock_backend(vec![], unauthorized_body(), false).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        let mut events = client.tokens().subscribe();

        let result = client
            .request_json::<Value>(client.request(Method::GET, "/protected"))
            .await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 0);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn no_retry_policy_fails_terminally_without_refresh() {
        let backend = mock_backend(vec![(200, rotated_pair_body())], unauthorized_body(), false).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        let mut events = client.tokens().subscribe();
        client.tokens().store(expired_pair());

        let result = client
            .request_json::<Value>(client.request(Method::GET, "/protected").no_retry())
            .await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 0);
        assert_eq!(backend.protected_calls.load(Ordering::Relaxed), 1);
        // The stale session is still torn down.
        assert_eq!(client.tokens().token_pair(), None);
        assert!(matches!(events.try_recv(), Ok(AuthEvent::SignInRequired)));
    }

    #[tokio::test]
    async fn multipart_bodies_are_rebuilt_for_the_retry() {
        let backend =
            mock_backend(vec![(200, rotated_pair_body())], unauthorized_body(), false).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, vec![]);
        client.tokens().store(expired_pair());

        let part = FilePart {
            field: "file".to_owned(),
            file_name: "photo.png".to_owned(),
            content_type: "image/png".to_owned(),
            data: vec![0x89, 0x50, 0x4e, 0x47],
        };
        let value: Value = client
            .request_json(client.request(Method::POST, "/protected").file(part))
            .await
            .expect("upload after refresh");
        assert_eq!(value["ok"], true);
        assert_eq!(backend.protected_calls.load(Ordering::Relaxed), 2);
        assert_eq!(backend.refresh_calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn policy_comes_from_the_notice_path_config() {
        let backend = mock_backend(vec![], unauthorized_body(), false).await;
        let dir = tempfile::tempdir().expect("tempdir");
        let client = test_client(backend.addr, &dir, ClientConfig::default().notice_paths);

        let quiet = client.policy_for("/auth/send-change-password-code");
        assert_eq!(quiet.on_auth_failure, AuthFailureAction::Notify);
        assert!(quiet.retry_on_auth_failure);

        let loud = client.policy_for("/articles/");
        assert_eq!(loud.on_auth_failure, AuthFailureAction::Redirect);
    }
}
