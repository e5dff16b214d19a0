//! # ctfd-client-rs
//!
//! A session-aware admin client for CTFd instances.
//!
//! Freshly deployed instances only expose a CSRF-protected HTML interface
//! until first-run setup completes. This crate drives that interface
//! (anti-forgery nonces, cookie sessions, redirects) to bootstrap an
//! instance, then escalates to an API token for everything else.
//!
//! ## Features
//!
//! - Anti-forgery nonce handling folded into every session request
//! - First-run setup with configuration import and optional mail relay
//! - Reset back to first-run state
//! - API token reuse across runs
//! - Typed user, team, membership, challenge and token calls
//!
//! ## Example
//!
//! ```no_run
//! use ctfd_client_rs::{Availability, CtfdClient, SetupSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client =
//!         CtfdClient::new("http://localhost:8000", "admin", "password", "my-tool/1.0")?;
//!     if client.connect().await? == Availability::Unprovisioned {
//!         let spec =
//!             SetupSpec::new("Winter CTF", "Yearly event", "admin@example.com", "export.zip");
//!         client.create_setup(&spec).await?;
//!     }
//!     for team in client.teams().list().await? {
//!         println!("{} ({})", team.name, team.id);
//!     }
//!     Ok(())
//! }
//! ```

mod client;

pub mod api;
pub mod config;
pub mod events;
pub mod resources;
pub mod session;
pub mod setup;

#[cfg(test)]
mod testing;

pub use crate::client::{CtfdClient, CtfdClientBuilder, CtfdError, CtfdResult};

pub use crate::api::{
    ApiEnvelope,
    ApiToken,
    Meta,
    Pagination,
    PRIMARY_ADMIN_ID,
    RequestExecutor,
    SessionResponse,
    TokenProvisioner,
};

pub use crate::config::{ConfigError, CtfdClientConfig};

pub use crate::events::{
    ClientEvent,
    ErrorEvent,
    EventDispatcher,
    EventHandler,
    LoggingHandler,
    RequestEvent,
    SessionEvent,
    SetupStepEvent,
    TokenEvent,
};

pub use crate::resources::{
    Challenge,
    NewTeam,
    NewUser,
    Tag,
    Team,
    TeamMembership,
    UpdateUser,
    User,
    UserType,
};

pub use crate::session::{
    Availability,
    Credentials,
    HtmlError,
    HttpTransport,
    NonceError,
    ReqwestTransport,
    Session,
    SessionManager,
    SessionState,
    TransportError,
    TransportRequest,
    TransportResponse,
    extract_alert_message,
    extract_nonce,
};

pub use crate::setup::{CtfdSetup, EmailConfig, SetupOrchestrator, SetupSpec, SetupStep};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
