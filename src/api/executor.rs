//! Authenticated request execution.
//!
//! Two variants exist because the platform exposes its stable interface
//! behind an API token, while a handful of admin flows (and token creation
//! itself) still need the cookie session plus a fresh anti-forgery header.

use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::envelope::ApiEnvelope;
use super::tokens::ApiToken;
use crate::client::{CtfdError, CtfdResult};
use crate::session::{
    RequestBody, SETTINGS_PATH, SessionManager, TransportRequest, TransportResponse,
};

/// Scheme used in the `Authorization` header for API tokens.
pub const AUTHORIZATION_SCHEME: &str = "Token";
const CSRF_HEADER: &str = "csrf-token";

/// Body of a session call: decoded envelope when the endpoint answered with
/// JSON, raw text otherwise (HTML pages, redirects with bodies).
#[derive(Debug, Clone, PartialEq)]
pub enum SessionResponse {
    Envelope(ApiEnvelope),
    Raw(String),
}

impl SessionResponse {
    fn from_response(response: &TransportResponse) -> Self {
        if response.is_json()
            && let Ok(envelope) = ApiEnvelope::from_slice(&response.body)
        {
            return SessionResponse::Envelope(envelope);
        }
        SessionResponse::Raw(response.text())
    }
}

/// Issues structured-API and session calls on top of a [`SessionManager`].
pub struct RequestExecutor {
    sessions: SessionManager,
    credential: Option<ApiToken>,
}

impl RequestExecutor {
    pub fn new(sessions: SessionManager) -> Self {
        Self {
            sessions,
            credential: None,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionManager {
        &mut self.sessions
    }

    pub fn credential(&self) -> Option<&ApiToken> {
        self.credential.as_ref()
    }

    pub fn adopt_token(&mut self, token: ApiToken) {
        self.credential = Some(token);
    }

    pub fn clear_credential(&mut self) {
        self.credential = None;
    }

    /// Structured GET decoding the envelope payload into `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> CtfdResult<T> {
        self.api_call(Method::GET, path, None).await
    }

    /// Structured call with a JSON body, decoding the payload into `T`.
    pub async fn send<T, B>(&self, method: Method, path: &str, body: &B) -> CtfdResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body)?;
        self.api_call(method, path, Some(body)).await
    }

    /// Structured call whose payload is irrelevant (deletes, config patches).
    pub async fn send_empty<B>(&self, method: Method, path: &str, body: &B) -> CtfdResult<()>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body)?;
        let envelope = self.api_envelope(method, path, Some(body)).await?;
        if envelope.success {
            Ok(())
        } else {
            Err(CtfdError::Api {
                status: 200,
                message: envelope.describe(),
            })
        }
    }

    async fn api_call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> CtfdResult<T> {
        self.api_envelope(method, path, body)
            .await?
            .into_data(200)
    }

    async fn api_envelope(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> CtfdResult<ApiEnvelope> {
        let url = self.sessions.session().endpoint(path)?;
        let mut request = TransportRequest::new(method, url)
            .with_header("content-type", "application/json")?;

        if let Some(value) = self.credential.as_ref().and_then(|token| token.value.as_deref()) {
            request = request.with_header(
                "authorization",
                &format!("{AUTHORIZATION_SCHEME} {value}"),
            )?;
        }
        if let Some(bytes) = body {
            request = request.with_body(RequestBody::Json(bytes));
        }

        let response = self.sessions.send(request).await?;
        if response.status != 200 {
            return Err(CtfdError::Api {
                status: response.status,
                message: status_message(&response),
            });
        }

        Ok(ApiEnvelope::from_slice(&response.body)?)
    }

    /// Session call: requires an active session, refreshes the anti-forgery
    /// token, sends it as a header, and requires HTTP 200.
    pub async fn session_call(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> CtfdResult<SessionResponse> {
        self.sessions.require_active()?;
        let nonce = self.sessions.refresh_token(SETTINGS_PATH).await?;

        let url = self.sessions.session().endpoint(path)?;
        let mut request = TransportRequest::new(method, url).with_header(CSRF_HEADER, &nonce)?;
        if let Some(value) = body {
            request = request
                .with_header("content-type", "application/json")?
                .with_body(RequestBody::Json(serde_json::to_vec(value)?));
        }

        let response = self.sessions.send(request).await?;
        if response.status != 200 {
            return Err(CtfdError::Api {
                status: response.status,
                message: status_message(&response),
            });
        }

        Ok(SessionResponse::from_response(&response))
    }

    /// Session call that must answer with a successful envelope.
    pub async fn session_json<T: DeserializeOwned>(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> CtfdResult<T> {
        match self.session_call(method, path, body).await? {
            SessionResponse::Envelope(envelope) => envelope.into_data(200),
            SessionResponse::Raw(_) => Err(CtfdError::Api {
                status: 200,
                message: format!("expected a JSON envelope from {path}, received a page"),
            }),
        }
    }
}

fn status_message(response: &TransportResponse) -> String {
    match ApiEnvelope::from_slice(&response.body) {
        Ok(envelope) => envelope.describe(),
        Err(_) => format!("unexpected status {}", response.status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::{Value, json};
    use url::Url;

    use crate::events::EventDispatcher;
    use crate::session::{Credentials, Session};
    use crate::testing::{
        StubTransport, html_page, json as json_response, ok_html, ok_json, redirect,
    };

    fn executor(transport: Arc<StubTransport>) -> RequestExecutor {
        let session = Session::new(
            Url::parse("http://ctfd.local").unwrap(),
            Credentials::new("admin", "hunter2"),
        );
        RequestExecutor::new(SessionManager::new(
            transport,
            session,
            Arc::new(EventDispatcher::new()),
        ))
    }

    fn token(value: &str) -> ApiToken {
        serde_json::from_value(json!({"id": 1, "type": "user", "user_id": 1, "value": value}))
            .unwrap()
    }

    #[tokio::test]
    async fn api_call_sends_token_and_decodes_payload() {
        let transport = Arc::new(StubTransport::new(vec![ok_json(
            json!({"success": true, "data": {"id": 7, "name": "red"}}),
        )]));
        let mut executor = executor(transport.clone());
        executor.adopt_token(token("ctfd_abc"));

        let data: Value = executor.get("/api/v1/teams/7").await.unwrap();

        assert_eq!(data["name"], "red");
        let request = transport.request(0);
        assert_eq!(request.headers["authorization"], "Token ctfd_abc");
        assert_eq!(request.headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn api_call_success_false_is_api_failure() {
        let transport = Arc::new(StubTransport::new(vec![ok_json(
            json!({"success": false, "message": "x"}),
        )]));
        let executor = executor(transport);

        let err = executor.get::<Value>("/api/v1/users").await.unwrap_err();

        match err {
            CtfdError::Api { status, message } => {
                assert_eq!(status, 200);
                assert_eq!(message, "x");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn api_call_non_200_is_api_failure() {
        let transport = Arc::new(StubTransport::new(vec![json_response(
            403,
            json!({
                "message": "You don't have the permission to access the requested resource.",
                "success": false
            }),
        )]));
        let executor = executor(transport);

        let err = executor.get::<Value>("/api/v1/users").await.unwrap_err();
        assert!(matches!(err, CtfdError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn api_call_without_token_omits_authorization() {
        let transport = Arc::new(StubTransport::new(vec![ok_json(
            json!({"success": true, "data": []}),
        )]));
        let executor = executor(transport.clone());

        let _: Vec<Value> = executor.get("/api/v1/challenges").await.unwrap();
        assert!(transport.request(0).headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn session_call_requires_active_session() {
        let transport = Arc::new(StubTransport::new(vec![]));
        let mut executor = executor(transport.clone());

        let err = executor
            .session_call(Method::GET, "/api/v1/tokens", None)
            .await
            .unwrap_err();

        assert!(matches!(err, CtfdError::NotAuthenticated));
        assert!(transport.paths().is_empty());
    }

    #[tokio::test]
    async fn session_call_refreshes_nonce_and_tags_body() {
        let transport = Arc::new(StubTransport::new(vec![
            ok_html(&html_page("n1")),
            ok_json(json!({"success": true, "data": []})),
            ok_html(&html_page("n2")),
            ok_html("<html>admin page</html>"),
        ]));
        let mut executor = executor(transport.clone());
        executor.sessions_mut().mark_active();

        let first = executor
            .session_call(Method::GET, "/api/v1/tokens", None)
            .await
            .unwrap();
        let second = executor
            .session_call(Method::GET, "/admin/statistics", None)
            .await
            .unwrap();

        assert!(matches!(first, SessionResponse::Envelope(ref e) if e.success));
        assert_eq!(second, SessionResponse::Raw("<html>admin page</html>".into()));
        assert_eq!(
            transport.paths(),
            vec![
                "GET /settings",
                "GET /api/v1/tokens",
                "GET /settings",
                "GET /admin/statistics"
            ]
        );
        assert_eq!(transport.request(1).headers["csrf-token"], "n1");
        assert_eq!(transport.request(3).headers["csrf-token"], "n2");
    }

    #[tokio::test]
    async fn sign_in_then_session_call_reuses_session() {
        let transport = Arc::new(StubTransport::new(vec![
            ok_html(&html_page("login1")),
            redirect("/challenges"),
            ok_html(&html_page("settings1")),
            ok_json(json!({"success": true, "data": []})),
        ]));
        let mut executor = executor(transport.clone());

        executor.sessions_mut().sign_in().await.unwrap();
        let tokens: Vec<Value> = executor
            .session_json(Method::GET, "/api/v1/tokens", None)
            .await
            .unwrap();

        assert!(tokens.is_empty());
        assert_eq!(transport.count("POST", "/login"), 1);
        assert_eq!(transport.count("GET", "/login"), 1);
    }

    #[tokio::test]
    async fn session_call_non_200_is_api_failure() {
        let transport = Arc::new(StubTransport::new(vec![
            ok_html(&html_page("n1")),
            json_response(
                403,
                json!({"success": false, "message": "You don't have the permission"}),
            ),
        ]));
        let mut executor = executor(transport.clone());
        executor.sessions_mut().mark_active();

        let err = executor
            .session_call(Method::POST, "/api/v1/tokens", Some(&json!({})))
            .await
            .unwrap_err();

        match err {
            CtfdError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "You don't have the permission");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.paths(), vec!["GET /settings", "POST /api/v1/tokens"]);
    }

    #[tokio::test]
    async fn session_call_non_200_page_reports_status() {
        let transport = Arc::new(StubTransport::new(vec![
            ok_html(&html_page("n1")),
            redirect("/login?next=%2Fadmin"),
        ]));
        let mut executor = executor(transport);
        executor.sessions_mut().mark_active();

        let err = executor
            .session_call(Method::GET, "/admin/statistics", None)
            .await
            .unwrap_err();

        match err {
            CtfdError::Api { status, message } => {
                assert_eq!(status, 302);
                assert_eq!(message, "unexpected status 302");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn session_json_rejects_html() {
        let transport = Arc::new(StubTransport::new(vec![
            ok_html(&html_page("n1")),
            ok_html("<html></html>"),
        ]));
        let mut executor = executor(transport);
        executor.sessions_mut().mark_active();

        let err = executor
            .session_json::<Value>(Method::GET, "/api/v1/tokens", None)
            .await
            .unwrap_err();
        assert!(matches!(err, CtfdError::Api { status: 200, .. }));
    }
}
