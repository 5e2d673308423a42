//! OAuth2 authorization-code flow driven through a short-lived local listener.
//!
//! The browser is sent to `/auth`, bounced to the authorization server, and
//! comes back to `/sessions/callback` with a code. The code is exchanged for
//! a bearer token, and `/authed` hands that token to the waiting pipeline.
//! One attempt per process: any failure ends the flow.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use base64::Engine;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::client::Endpoints;
use crate::config::{AppCredentials, Credentials};
use crate::error::{ReleaseNotesError, Result};
use crate::responses::{TokenRequest, TokenResponse};

pub const DEFAULT_PORT: u16 = 8081;

const AUDIENCE: &str = "api.atlassian.com";
const SCOPE: &str = "read:jira-work";
const CALLBACK_PATH: &str = "/sessions/callback";
const AUTHED_PATH: &str = "/authed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    AwaitingAuthorization,
    AwaitingCallback,
    Authorized,
    Failed(String),
    Succeeded,
}

/// State of a single authorization attempt.
pub struct OAuthFlow {
    app: AppCredentials,
    state_param: String,
    redirect_uri: String,
    endpoints: Endpoints,
    state: AuthState,
    token: Option<String>,
}

impl OAuthFlow {
    pub fn new(credentials: &Credentials, port: u16, endpoints: Endpoints) -> Self {
        let user = &credentials.user;
        let state_param = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", user.user, user.token));

        Self {
            app: credentials.app.clone(),
            state_param,
            redirect_uri: format!("http://localhost:{port}{CALLBACK_PATH}"),
            endpoints,
            state: AuthState::Idle,
            token: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn authorization_url(&self) -> Result<String> {
        let url = Url::parse_with_params(
            &self.endpoints.authorize_url(),
            &[
                ("audience", AUDIENCE),
                ("client_id", self.app.app_id.as_str()),
                ("scope", SCOPE),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", self.state_param.as_str()),
                ("response_type", "code"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| ReleaseNotesError::Auth(format!("invalid authorization url: {e}")))?;
        Ok(url.into())
    }

    /// Idle/AwaitingAuthorization -> AwaitingAuthorization. Returns the URL the
    /// user agent is redirected to.
    pub fn begin(&mut self) -> Result<String> {
        match self.state.clone() {
            AuthState::Idle | AuthState::AwaitingAuthorization => {
                let url = self.authorization_url()?;
                self.state = AuthState::AwaitingAuthorization;
                Ok(url)
            }
            other => Err(self.unexpected(other, "authorization request")),
        }
    }

    /// AwaitingAuthorization -> AwaitingCallback. Returns the grant to post to
    /// the token endpoint.
    pub fn receive_code(&mut self, code: &str) -> Result<OwnedTokenRequest> {
        match self.state.clone() {
            AuthState::AwaitingAuthorization => {
                self.state = AuthState::AwaitingCallback;
                Ok(OwnedTokenRequest {
                    token_url: self.endpoints.token_url(),
                    client_id: self.app.app_id.clone(),
                    client_secret: self.app.app_secret.clone(),
                    redirect_uri: self.redirect_uri.clone(),
                    code: code.to_string(),
                })
            }
            other => Err(self.unexpected(other, "callback")),
        }
    }

    /// AwaitingCallback -> Authorized.
    pub fn authorize(&mut self, token: String) -> Result<()> {
        match self.state.clone() {
            AuthState::AwaitingCallback => {
                self.state = AuthState::Authorized;
                self.token = Some(token);
                Ok(())
            }
            other => Err(self.unexpected(other, "access token")),
        }
    }

    /// Authorized -> Succeeded, releasing the token.
    pub fn take_token(&mut self) -> Result<String> {
        match (self.state.clone(), self.token.take()) {
            (AuthState::Authorized, Some(token)) => {
                self.state = AuthState::Succeeded;
                Ok(token)
            }
            (other, _) => Err(self.unexpected(other, "token hand-off")),
        }
    }

    pub fn fail(&mut self, reason: &str) -> ReleaseNotesError {
        self.state = AuthState::Failed(reason.to_string());
        self.token = None;
        ReleaseNotesError::Auth(reason.to_string())
    }

    fn unexpected(&mut self, state: AuthState, step: &str) -> ReleaseNotesError {
        self.fail(&format!("unexpected {step} while {state:?}"))
    }
}

/// Token request detached from the flow so the exchange can run without
/// holding the flow lock.
#[derive(Debug, Clone)]
pub struct OwnedTokenRequest {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub code: String,
}

/// Exchange an authorization code for an access token.
pub async fn exchange_code(http: &reqwest::Client, grant: &OwnedTokenRequest) -> Result<String> {
    let body = TokenRequest {
        client_id: &grant.client_id,
        client_secret: &grant.client_secret,
        grant_type: "authorization_code",
        redirect_uri: &grant.redirect_uri,
        code: &grant.code,
    };

    let response = http
        .post(&grant.token_url)
        .json(&body)
        .send()
        .await
        .map_err(|e| ReleaseNotesError::Auth(format!("token request failed: {e}")))?;

    let details: TokenResponse = response
        .json()
        .await
        .map_err(|e| ReleaseNotesError::Auth(format!("unreadable token response: {e}")))?;

    if let Some(error) = details.error {
        let reason = match details.error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        return Err(ReleaseNotesError::Auth(reason));
    }

    details
        .access_token
        .ok_or_else(|| ReleaseNotesError::Auth("no access token in response".to_string()))
}

struct Shared {
    flow: Mutex<OAuthFlow>,
    outcome: Mutex<Option<oneshot::Sender<Result<String>>>>,
    http: reqwest::Client,
}

impl Shared {
    fn flow(&self) -> MutexGuard<'_, OAuthFlow> {
        self.flow.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn finish(&self, outcome: Result<String>) {
        let sender = self
            .outcome
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
    }

    fn abort(&self, reason: &str) -> Response {
        error!("authorization failed: {reason}");
        let err = self.flow().fail(reason);
        self.finish(Err(err));
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<p>Authorization failed: {}</p>",
                html_escape::encode_text(reason)
            )),
        )
            .into_response()
    }
}

/// Bind the local listener, open the browser on `/auth`, and wait for the
/// flow to produce a token.
pub async fn authorize(credentials: &Credentials, port: u16, endpoints: Endpoints) -> Result<String> {
    let listeners = bind_loopback(port).await?;
    let port = listeners[0].local_addr()?.port();
    info!("Server is listening on port {port}");

    let start = format!("http://localhost:{port}/auth");
    if let Err(e) = open::that(&start) {
        warn!("could not open a browser: {e}");
    }
    info!("Open {start} in your browser to authorize.");

    serve_flow(listeners, OAuthFlow::new(credentials, port, endpoints)).await
}

/// Bind `port` on the IPv4 loopback, and on the IPv6 loopback where the host
/// has one, so `localhost` reaches the listener whichever address it resolves
/// to. Only the IPv4 bind is required.
async fn bind_loopback(port: u16) -> Result<Vec<TcpListener>> {
    let v4 = TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await?;
    let port = v4.local_addr()?.port();

    let mut listeners = vec![v4];
    match TcpListener::bind((Ipv6Addr::LOCALHOST, port)).await {
        Ok(v6) => listeners.push(v6),
        Err(e) => debug!("not listening on [::1]:{port}: {e}"),
    }
    Ok(listeners)
}

/// Serve the redirect endpoints on every listener until the flow ends, then
/// shut them all down.
pub async fn serve_flow(listeners: Vec<TcpListener>, flow: OAuthFlow) -> Result<String> {
    let (outcome_tx, outcome_rx) = oneshot::channel();
    let shared = Arc::new(Shared {
        flow: Mutex::new(flow),
        outcome: Mutex::new(Some(outcome_tx)),
        http: reqwest::Client::new(),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let servers: Vec<_> = listeners
        .into_iter()
        .map(|listener| {
            let app = router(shared.clone());
            let mut shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.changed().await;
                    })
                    .await
            })
        })
        .collect();
    // Only the servers hold the outcome sender from here on.
    drop(shared);

    let outcome = outcome_rx.await.map_err(|_| {
        ReleaseNotesError::Auth("listener stopped before authorization completed".to_string())
    });

    let _ = shutdown_tx.send(true);
    for server in servers {
        if let Ok(Err(e)) = server.await {
            warn!("listener error: {e}");
        }
    }

    outcome?
}

fn router(shared: Arc<Shared>) -> Router {
    Router::new()
        .route("/", get(start))
        .route("/auth", get(start))
        .route(CALLBACK_PATH, get(callback))
        .route(AUTHED_PATH, get(authed))
        .with_state(shared)
}

async fn start(State(shared): State<Arc<Shared>>) -> Response {
    let begun = shared.flow().begin();
    match begun {
        Ok(url) => {
            info!("redirected to authorization url");
            Redirect::to(&url).into_response()
        }
        Err(e) => shared.abort(&e.to_string()),
    }
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback(
    State(shared): State<Arc<Shared>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    info!("at the callback url");

    let Some(code) = params.code else {
        let reason = match (params.error, params.error_description) {
            (Some(error), Some(description)) => format!("{error}: {description}"),
            (Some(error), None) => error,
            _ => "callback without an authorization code".to_string(),
        };
        return shared.abort(&reason);
    };

    let grant = shared.flow().receive_code(&code);
    let grant = match grant {
        Ok(grant) => grant,
        Err(e) => return shared.abort(&e.to_string()),
    };

    let token = match exchange_code(&shared.http, &grant).await {
        Ok(token) => token,
        Err(e) => return shared.abort(&e.to_string()),
    };

    let authorized = shared.flow().authorize(token);
    match authorized {
        Ok(()) => {
            info!("redirecting to {AUTHED_PATH}");
            Redirect::to(AUTHED_PATH).into_response()
        }
        Err(e) => shared.abort(&e.to_string()),
    }
}

async fn authed(State(shared): State<Arc<Shared>>) -> Response {
    let token = shared.flow().take_token();
    match token {
        Ok(token) => {
            info!("got a token");
            shared.finish(Ok(token));
            Html("<p>Success! Fetching issues, you can close this window.</p>").into_response()
        }
        Err(e) => shared.abort(&e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserCredentials;
    use crate::test_support;
    use axum::{routing::post, Json};
    use serde_json::{json, Value};

    fn credentials() -> Credentials {
        Credentials {
            app: AppCredentials {
                app_id: "client-id".to_string(),
                app_secret: "client-secret".to_string(),
            },
            user: UserCredentials {
                user: "someone@example.com".to_string(),
                token: "api-token".to_string(),
            },
        }
    }

    fn token_server(response: Value) -> Router {
        Router::new().route(
            "/oauth/token",
            post(move |Json(body): Json<Value>| async move {
                assert_eq!(body["grant_type"], "authorization_code");
                assert_eq!(body["client_id"], "client-id");
                assert_eq!(body["client_secret"], "client-secret");
                assert_eq!(body["code"], "the-code");
                Json(response)
            }),
        )
    }

    #[test]
    fn test_authorization_url() {
        let flow = OAuthFlow::new(&credentials(), 8081, Endpoints::default());
        let url = Url::parse(&flow.authorization_url().unwrap()).unwrap();

        assert_eq!(url.host_str(), Some("auth.atlassian.com"));
        assert_eq!(url.path(), "/authorize");

        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], "client-id");
        assert_eq!(query["scope"], "read:jira-work");
        assert_eq!(query["audience"], "api.atlassian.com");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["prompt"], "consent");
        assert_eq!(query["redirect_uri"], "http://localhost:8081/sessions/callback");

        let state = base64::engine::general_purpose::STANDARD
            .decode(&query["state"])
            .unwrap();
        assert_eq!(state, b"someone@example.com:api-token");
    }

    #[test]
    fn test_state_machine_happy_path() {
        let mut flow = OAuthFlow::new(&credentials(), 8081, Endpoints::default());
        assert_eq!(flow.state(), &AuthState::Idle);

        flow.begin().unwrap();
        assert_eq!(flow.state(), &AuthState::AwaitingAuthorization);

        let grant = flow.receive_code("the-code").unwrap();
        assert_eq!(grant.code, "the-code");
        assert_eq!(grant.token_url, "https://auth.atlassian.com/oauth/token");
        assert_eq!(flow.state(), &AuthState::AwaitingCallback);

        flow.authorize("bearer".to_string()).unwrap();
        assert_eq!(flow.state(), &AuthState::Authorized);

        assert_eq!(flow.take_token().unwrap(), "bearer");
        assert_eq!(flow.state(), &AuthState::Succeeded);
    }

    #[test]
    fn test_callback_before_authorization_fails() {
        let mut flow = OAuthFlow::new(&credentials(), 8081, Endpoints::default());
        let err = flow.receive_code("the-code").unwrap_err();

        assert!(matches!(err, ReleaseNotesError::Auth(_)));
        assert!(matches!(flow.state(), AuthState::Failed(_)));
        assert!(flow.begin().is_err());
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let base = test_support::serve(token_server(json!({
            "access_token": "bearer-123",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .await;

        let mut flow = OAuthFlow::new(&credentials(), 8081, test_support::endpoints(&base));
        flow.begin().unwrap();
        let grant = flow.receive_code("the-code").unwrap();

        let token = exchange_code(&reqwest::Client::new(), &grant).await.unwrap();
        assert_eq!(token, "bearer-123");
    }

    #[tokio::test]
    async fn test_exchange_code_error_response() {
        let base = test_support::serve(token_server(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code"
        })))
        .await;

        let mut flow = OAuthFlow::new(&credentials(), 8081, test_support::endpoints(&base));
        flow.begin().unwrap();
        let grant = flow.receive_code("the-code").unwrap();

        let err = exchange_code(&reqwest::Client::new(), &grant).await.unwrap_err();
        match err {
            ReleaseNotesError::Auth(reason) => assert!(reason.contains("invalid_grant")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_exchange_code_missing_token() {
        let base = test_support::serve(token_server(json!({"token_type": "Bearer"}))).await;

        let mut flow = OAuthFlow::new(&credentials(), 8081, test_support::endpoints(&base));
        flow.begin().unwrap();
        let grant = flow.receive_code("the-code").unwrap();

        assert!(matches!(
            exchange_code(&reqwest::Client::new(), &grant).await,
            Err(ReleaseNotesError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_redirect_chain_delivers_token() {
        let upstream = test_support::serve(token_server(json!({"access_token": "bearer-123"}))).await;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let flow = OAuthFlow::new(&credentials(), port, test_support::endpoints(&upstream));
        let pending = tokio::spawn(serve_flow(vec![listener], flow));

        let browser = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let local = format!("http://127.0.0.1:{port}");

        let response = browser.get(format!("{local}/auth")).send().await.unwrap();
        assert!(response.status().is_redirection());
        let location = response.headers()["location"].to_str().unwrap().to_string();
        assert!(location.starts_with(&format!("{upstream}/authorize?")));

        let response = browser
            .get(format!("{local}/sessions/callback?code=the-code&state=x"))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()["location"], "/authed");

        let response = browser.get(format!("{local}/authed")).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        assert_eq!(pending.await.unwrap().unwrap(), "bearer-123");
    }

    #[tokio::test]
    async fn test_flow_spans_every_listener() {
        let upstream = test_support::serve(token_server(json!({"access_token": "bearer-456"}))).await;

        let primary = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let secondary = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = primary.local_addr().unwrap().port();
        let other = format!("http://{}", secondary.local_addr().unwrap());
        let local = format!("http://127.0.0.1:{port}");

        let flow = OAuthFlow::new(&credentials(), port, test_support::endpoints(&upstream));
        let pending = tokio::spawn(serve_flow(vec![primary, secondary], flow));

        let browser = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        let response = browser.get(format!("{local}/auth")).send().await.unwrap();
        assert!(response.status().is_redirection());

        let response = browser
            .get(format!("{other}/sessions/callback?code=the-code&state=x"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()["location"], "/authed");

        let response = browser.get(format!("{local}/authed")).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        assert_eq!(pending.await.unwrap().unwrap(), "bearer-456");
    }

    #[tokio::test]
    async fn test_bind_loopback_shares_one_port() {
        let listeners = bind_loopback(0).await.unwrap();
        let first = listeners[0].local_addr().unwrap();

        assert_eq!(first.ip(), Ipv4Addr::LOCALHOST);
        assert_ne!(first.port(), 0);
        for listener in &listeners[1..] {
            let addr = listener.local_addr().unwrap();
            assert_eq!(addr.ip(), Ipv6Addr::LOCALHOST);
            assert_eq!(addr.port(), first.port());
        }
    }

    #[tokio::test]
    async fn test_serve_without_listeners_fails() {
        let flow = OAuthFlow::new(&credentials(), 8081, Endpoints::default());
        assert!(matches!(
            serve_flow(Vec::new(), flow).await,
            Err(ReleaseNotesError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn test_denied_authorization_ends_flow() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let flow = OAuthFlow::new(&credentials(), port, Endpoints::default());
        let pending = tokio::spawn(serve_flow(vec![listener], flow));

        let browser = reqwest::Client::new();
        let response = browser
            .get(format!(
                "http://127.0.0.1:{port}/sessions/callback?error=access_denied"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);

        let err = pending.await.unwrap().unwrap_err();
        match err {
            ReleaseNotesError::Auth(reason) => assert_eq!(reason, "access_denied"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
