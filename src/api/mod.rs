//! Request execution over the platform's two authentication schemes, plus
//! API token provisioning.

pub mod envelope;
pub mod executor;
pub mod tokens;

pub use envelope::{ApiEnvelope, Meta, Pagination};
pub use executor::{AUTHORIZATION_SCHEME, RequestExecutor, SessionResponse};
pub use tokens::{ApiToken, PRIMARY_ADMIN_ID, TokenProvisioner};
