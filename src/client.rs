//! High level client.
//!
//! Wires the transport, session manager, request executor and setup
//! orchestrator together behind one handle per platform instance. All
//! stateful calls take `&mut self`: the cookie jar and the rotating
//! anti-forgery token belong to exactly one client and must be used
//! sequentially.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::api::{ApiToken, RequestExecutor, TokenProvisioner};
use crate::config::{ConfigError, CtfdClientConfig};
use crate::events::{ClientEvent, ErrorEvent, EventDispatcher, EventHandler};
use crate::resources::{Challenges, Teams, Tokens, Users};
use crate::session::{
    Availability, Credentials, HtmlError, HttpTransport, NonceError, ReqwestTransport, Session,
    SessionManager, SessionState, TransportError,
};
use crate::setup::{CtfdSetup, SetupOrchestrator, SetupSpec, SetupStep, read_setup};

/// Result alias used across the crate.
pub type CtfdResult<T> = Result<T, CtfdError>;

/// Classified failures surfaced by the client.
#[derive(Debug, Error)]
pub enum CtfdError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("authentication failed: {reason}")]
    AuthenticationFailed { reason: String },
    #[error("{step} failed: {message}")]
    Protocol { step: SetupStep, message: String },
    #[error("{step} failed (status {status}) and the error page could not be read: {source}")]
    ErrorExtraction {
        step: SetupStep,
        status: u16,
        source: HtmlError,
    },
    #[error("api request failed (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("no anti-forgery token on {path}: {source}")]
    MissingToken { path: String, source: NonceError },
    #[error("no active session")]
    NotAuthenticated,
    #[error("json error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Fluent builder for [`CtfdClient`].
pub struct CtfdClientBuilder {
    config: CtfdClientConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    handlers: Vec<Arc<dyn EventHandler>>,
    logging: bool,
}

impl CtfdClientBuilder {
    pub fn new(config: CtfdClientConfig) -> Self {
        Self {
            config,
            transport: None,
            handlers: Vec::new(),
            logging: true,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_admin_user_id(mut self, admin_user_id: u64) -> Self {
        self.config.admin_user_id = admin_user_id;
        self
    }

    /// Replace the reqwest transport, e.g. with a stub in tests. The
    /// transport must keep cookies and must not follow redirects.
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn disable_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    pub fn build(self) -> CtfdResult<CtfdClient> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(
                &self.config.user_agent,
                self.config.timeout,
            )?),
        };

        let mut events = if self.logging {
            EventDispatcher::with_logging()
        } else {
            EventDispatcher::new()
        };
        for handler in self.handlers {
            events.register_handler(handler);
        }

        let session = Session::new(
            self.config.base_url.clone(),
            Credentials::new(self.config.username.clone(), self.config.password.clone()),
        );
        let sessions = SessionManager::new(transport, session, Arc::new(events));

        Ok(CtfdClient {
            config: self.config,
            executor: RequestExecutor::new(sessions),
        })
    }
}

/// Admin client for one platform instance.
pub struct CtfdClient {
    config: CtfdClientConfig,
    executor: RequestExecutor,
}

impl CtfdClient {
    /// Construct a client with default timeout and administrator id.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> CtfdResult<Self> {
        let config = CtfdClientConfig::new(base_url, username, password)?;
        CtfdClientBuilder::new(config)
            .with_user_agent(user_agent)
            .build()
    }

    pub fn builder(config: CtfdClientConfig) -> CtfdClientBuilder {
        CtfdClientBuilder::new(config)
    }

    /// Construct a client from `CTFD_*` environment variables.
    pub fn from_env() -> CtfdResult<Self> {
        CtfdClientBuilder::new(CtfdClientConfig::from_env()?).build()
    }

    pub fn config(&self) -> &CtfdClientConfig {
        &self.config
    }

    pub fn session_state(&self) -> SessionState {
        self.executor.sessions().session().state()
    }

    pub fn credential(&self) -> Option<&ApiToken> {
        self.executor.credential()
    }

    /// Configure-time handshake: when the instance is already provisioned,
    /// sign in and adopt an API token; otherwise stay unauthenticated so
    /// [`CtfdClient::create_setup`] can run.
    pub async fn connect(&mut self) -> CtfdResult<Availability> {
        let availability = self.executor.sessions().check_availability().await?;
        if availability == Availability::Unprovisioned {
            log::info!(
                "{} has not been set up yet; skipping sign-in",
                self.config.base_url
            );
            return Ok(availability);
        }

        let result = self.sign_in().await;
        self.report("sign-in", result)?;

        let result = TokenProvisioner::new(&mut self.executor, self.config.admin_user_id)
            .get_or_create_token()
            .await;
        self.report("token provisioning", result)?;

        Ok(availability)
    }

    pub async fn check_availability(&self) -> CtfdResult<Availability> {
        self.executor.sessions().check_availability().await
    }

    pub async fn sign_in(&mut self) -> CtfdResult<()> {
        self.executor.sessions_mut().sign_in().await
    }

    pub async fn sign_out(&mut self) -> CtfdResult<()> {
        self.executor.sessions_mut().sign_out().await
    }

    /// Run first-run setup, import, and token provisioning.
    pub async fn create_setup(&mut self, spec: &SetupSpec) -> CtfdResult<()> {
        SetupOrchestrator::new(&mut self.executor, self.config.admin_user_id)
            .create(spec)
            .await
            .map(|_| ())
    }

    /// Reset the instance back to its first-run state.
    pub async fn delete_setup(&mut self) -> CtfdResult<()> {
        SetupOrchestrator::new(&mut self.executor, self.config.admin_user_id)
            .delete()
            .await
    }

    pub async fn get_setup(&self) -> CtfdResult<CtfdSetup> {
        read_setup(&self.executor).await
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(&self.executor)
    }

    pub fn teams(&self) -> Teams<'_> {
        Teams::new(&self.executor)
    }

    pub fn challenges(&self) -> Challenges<'_> {
        Challenges::new(&self.executor)
    }

    pub fn tokens(&self) -> Tokens<'_> {
        Tokens::new(&self.executor)
    }

    fn report<T>(&self, operation: &str, result: CtfdResult<T>) -> CtfdResult<T> {
        if let Err(err) = &result {
            self.executor
                .sessions()
                .events()
                .dispatch(ClientEvent::Error(ErrorEvent {
                    operation: operation.to_string(),
                    error: err.to_string(),
                    timestamp: chrono::Utc::now(),
                }));
        }
        result
    }
}
