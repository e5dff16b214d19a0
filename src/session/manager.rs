//! Cookie session and anti-forgery token lifecycle.
//!
//! The platform rotates the CSRF nonce every time a page is rendered and
//! renders it differently per area (public login, user settings, admin
//! pages), so the token is always fetched from the page matching the request
//! that is about to be made and never cached across calls.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use http::Method;
use url::Url;

use super::html::extract_alert_message;
use super::nonce::extract_nonce;
use super::transport::{HttpTransport, RequestBody, TransportRequest, TransportResponse};
use crate::client::{CtfdError, CtfdResult};
use crate::events::{ClientEvent, EventDispatcher, RequestEvent, SessionEvent};

pub const LOGIN_PATH: &str = "/login";
pub const LOGOUT_PATH: &str = "/logout";
pub const SETTINGS_PATH: &str = "/settings";
pub const SETUP_PATH: &str = "/setup";
pub const ADMIN_CONFIG_PATH: &str = "/admin/config";

/// Username/password pair used for the administrator account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    SessionActive,
}

/// Outcome of probing the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Setup has completed; sign-in can proceed.
    Provisioned,
    /// The login page redirects to first-run setup.
    Unprovisioned,
}

/// Per-client session data. The cookie jar lives in the transport.
#[derive(Debug, Clone)]
pub struct Session {
    base_url: Url,
    nonce: Option<String>,
    credentials: Credentials,
    state: SessionState,
}

impl Session {
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        Self {
            base_url,
            nonce: None,
            credentials,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::SessionActive
    }

    /// Resolve `path` below the base address, keeping any base path prefix
    /// (`https://host/ctfd` + `/login` -> `https://host/ctfd/login`).
    pub fn endpoint(&self, path: &str) -> CtfdResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

/// Owns the session and drives sign-in, sign-out and nonce refreshes.
pub struct SessionManager {
    transport: Arc<dyn HttpTransport>,
    session: Session,
    events: Arc<EventDispatcher>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Session,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            transport,
            session,
            events,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// Send a request as-is, recording a request event.
    pub async fn send(&self, request: TransportRequest) -> CtfdResult<TransportResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        let started = Instant::now();
        let response = self.transport.send(request).await?;

        self.events.dispatch(ClientEvent::Request(RequestEvent {
            method,
            url,
            status: response.status,
            latency: started.elapsed(),
            timestamp: Utc::now(),
        }));

        Ok(response)
    }

    /// Fetch `path` and store the anti-forgery token rendered on it.
    pub async fn refresh_token(&mut self, path: &str) -> CtfdResult<String> {
        let url = self.session.endpoint(path)?;
        let response = self.send(TransportRequest::new(Method::GET, url)).await?;

        let nonce = extract_nonce(&response.text()).map_err(|source| CtfdError::MissingToken {
            path: path.to_string(),
            source,
        })?;
        self.session.nonce = Some(nonce.clone());
        Ok(nonce)
    }

    /// Refresh the token on `token_path`, then POST `fields` (prefixed with
    /// the nonce) as a urlencoded form to `path`.
    pub async fn submit_form(
        &mut self,
        token_path: &str,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> CtfdResult<TransportResponse> {
        let nonce = self.refresh_token(token_path).await?;
        let mut form = Vec::with_capacity(fields.len() + 1);
        form.push(("nonce".to_string(), nonce));
        form.extend(fields);

        let url = self.session.endpoint(path)?;
        self.send(TransportRequest::new(Method::POST, url).with_body(RequestBody::Form(form)))
            .await
    }

    /// Authenticate with the configured credentials.
    pub async fn sign_in(&mut self) -> CtfdResult<()> {
        let credentials = self.session.credentials.clone();
        let response = self
            .submit_form(
                LOGIN_PATH,
                LOGIN_PATH,
                vec![
                    ("name".to_string(), credentials.username),
                    ("password".to_string(), credentials.password),
                ],
            )
            .await?;

        if response.is_redirect && !response.redirects_to(LOGIN_PATH) {
            self.transition(SessionState::SessionActive);
            return Ok(());
        }

        let reason = extract_alert_message(&response.text()).unwrap_or_else(|_| {
            format!(
                "not redirected to an authenticated page (status {})",
                response.status
            )
        });
        Err(CtfdError::AuthenticationFailed { reason })
    }

    /// Request the logout page. Any HTTP status is accepted.
    pub async fn sign_out(&mut self) -> CtfdResult<()> {
        let url = self.session.endpoint(LOGOUT_PATH)?;
        self.send(TransportRequest::new(Method::GET, url)).await?;
        self.session.nonce = None;
        self.transition(SessionState::Unauthenticated);
        Ok(())
    }

    /// Probe the login page to learn whether first-run setup has happened.
    pub async fn check_availability(&self) -> CtfdResult<Availability> {
        let url = self.session.endpoint(LOGIN_PATH)?;
        let response = self.send(TransportRequest::new(Method::GET, url)).await?;

        if response.redirects_to(SETUP_PATH) {
            Ok(Availability::Unprovisioned)
        } else {
            Ok(Availability::Provisioned)
        }
    }

    pub fn require_active(&self) -> CtfdResult<()> {
        if self.session.is_active() {
            Ok(())
        } else {
            Err(CtfdError::NotAuthenticated)
        }
    }

    /// The platform signs the administrator in when first-run setup
    /// succeeds, so the orchestrator promotes the session without a login.
    pub fn mark_active(&mut self) {
        self.transition(SessionState::SessionActive);
    }

    pub fn mark_inactive(&mut self) {
        self.session.nonce = None;
        self.transition(SessionState::Unauthenticated);
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.session.state;
        if from == to {
            return;
        }
        self.session.state = to;
        self.events.dispatch(ClientEvent::Session(SessionEvent {
            from,
            to,
            timestamp: Utc::now(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubTransport, html_page, ok_html, redirect};

    fn manager(transport: Arc<StubTransport>) -> SessionManager {
        let session = Session::new(
            Url::parse("http://ctfd.local/").unwrap(),
            Credentials::new("admin", "hunter2"),
        );
        SessionManager::new(transport, session, Arc::new(EventDispatcher::new()))
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let session = Session::new(
            Url::parse("https://example.com/ctfd/").unwrap(),
            Credentials::new("a", "b"),
        );
        assert_eq!(
            session.endpoint("/login").unwrap().as_str(),
            "https://example.com/ctfd/login"
        );
        assert_eq!(
            session.endpoint("api/v1/users/3").unwrap().as_str(),
            "https://example.com/ctfd/api/v1/users/3"
        );
    }

    #[test]
    fn credentials_debug_hides_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }

    #[tokio::test]
    async fn refresh_token_stores_nonce() {
        let transport = Arc::new(StubTransport::new(vec![ok_html(&html_page("abc123"))]));
        let mut manager = manager(transport.clone());

        let nonce = manager.refresh_token("/settings").await.unwrap();

        assert_eq!(nonce, "abc123");
        assert_eq!(manager.session().nonce(), Some("abc123"));
        assert_eq!(transport.paths(), vec!["GET /settings"]);
    }

    #[tokio::test]
    async fn refresh_token_without_nonce_is_missing_token() {
        let transport = Arc::new(StubTransport::new(vec![ok_html("<html></html>")]));
        let mut manager = manager(transport);

        let err = manager.refresh_token("/setup").await.unwrap_err();
        assert!(matches!(err, CtfdError::MissingToken { ref path, .. } if path == "/setup"));
    }

    #[tokio::test]
    async fn sign_in_posts_credentials_and_activates_session() {
        let transport = Arc::new(StubTransport::new(vec![
            ok_html(&html_page("n1")),
            redirect("/challenges"),
        ]));
        let mut manager = manager(transport.clone());

        manager.sign_in().await.unwrap();

        assert!(manager.session().is_active());
        assert_eq!(transport.paths(), vec!["GET /login", "POST /login"]);
        let login = transport.request(1);
        assert_eq!(login.body.field("nonce"), Some("n1"));
        assert_eq!(login.body.field("name"), Some("admin"));
        assert_eq!(login.body.field("password"), Some("hunter2"));
    }

    #[tokio::test]
    async fn sign_in_without_redirect_is_authentication_failure() {
        let transport = Arc::new(StubTransport::new(vec![
            ok_html(&html_page("n1")),
            ok_html(
                r#"<div class="alert"><span>Your username or password is incorrect</span></div>"#,
            ),
        ]));
        let mut manager = manager(transport);

        let err = manager.sign_in().await.unwrap_err();

        match err {
            CtfdError::AuthenticationFailed { reason } => {
                assert_eq!(reason, "Your username or password is incorrect")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!manager.session().is_active());
    }

    #[tokio::test]
    async fn sign_in_redirected_back_to_login_fails() {
        let transport = Arc::new(StubTransport::new(vec![
            ok_html(&html_page("n1")),
            redirect("/login?next=%2Fchallenges"),
        ]));
        let mut manager = manager(transport);

        let err = manager.sign_in().await.unwrap_err();
        assert!(matches!(err, CtfdError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn availability_follows_setup_redirect() {
        let transport = Arc::new(StubTransport::new(vec![
            redirect("/setup"),
            ok_html(&html_page("n1")),
        ]));
        let manager = manager(transport);

        assert_eq!(
            manager.check_availability().await.unwrap(),
            Availability::Unprovisioned
        );
        assert_eq!(
            manager.check_availability().await.unwrap(),
            Availability::Provisioned
        );
    }

    #[tokio::test]
    async fn sign_out_skips_nonce_and_deactivates() {
        let transport = Arc::new(StubTransport::new(vec![redirect("/")]));
        let mut manager = manager(transport.clone());
        manager.mark_active();

        manager.sign_out().await.unwrap();

        assert_eq!(transport.paths(), vec!["GET /logout"]);
        assert_eq!(manager.session().state(), SessionState::Unauthenticated);
        assert!(matches!(
            manager.require_active(),
            Err(CtfdError::NotAuthenticated)
        ));
    }
}
