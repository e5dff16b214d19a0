//! Settings and configuration module
//!
//! Provides the client configuration with:
//! - Builder-friendly defaults
//! - Environment loading
//! - Validation of the base address and credentials

pub mod settings;

pub use settings::{
    ConfigError, CtfdClientConfig, DEFAULT_TIMEOUT, ENV_ADMIN_USER_ID, ENV_PASSWORD, ENV_TIMEOUT,
    ENV_URL, ENV_USER_AGENT, ENV_USERNAME,
};
