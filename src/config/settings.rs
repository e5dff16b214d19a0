use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::api::PRIMARY_ADMIN_ID;

pub const ENV_URL: &str = "CTFD_URL";
pub const ENV_USERNAME: &str = "CTFD_USERNAME";
pub const ENV_PASSWORD: &str = "CTFD_PASSWORD";
pub const ENV_USER_AGENT: &str = "CTFD_USER_AGENT";
pub const ENV_TIMEOUT: &str = "CTFD_TIMEOUT_SECS";
pub const ENV_ADMIN_USER_ID: &str = "CTFD_ADMIN_USER_ID";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid base url '{value}': {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("base url must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("username and password must not be empty")]
    EmptyCredentials,
}

/// Connection settings for one platform instance.
#[derive(Clone)]
pub struct CtfdClientConfig {
    pub base_url: Url,
    pub username: String,
    pub password: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Account id whose API token is reused (the bootstrap administrator).
    pub admin_user_id: u64,
}

impl CtfdClientConfig {
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            username: username.into(),
            password: password.into(),
            user_agent: default_user_agent(),
            timeout: DEFAULT_TIMEOUT,
            admin_user_id: PRIMARY_ADMIN_ID,
        })
    }

    /// Read settings from `CTFD_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let mut config = Self::new(
            &required(ENV_URL)?,
            required(ENV_USERNAME)?,
            required(ENV_PASSWORD)?,
        )?;

        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|value| !value.is_empty()) {
            config.user_agent = agent;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            config.timeout = Duration::from_secs(parse_positive(ENV_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_ADMIN_USER_ID) {
            config.admin_user_id = parse_positive(ENV_ADMIN_USER_ID, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(ConfigError::EmptyCredentials);
        }
        Ok(())
    }
}

impl fmt::Debug for CtfdClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtfdClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("admin_user_id", &self.admin_user_id)
            .finish()
    }
}

pub(crate) fn default_user_agent() -> String {
    format!("ctfd-client-rs/{}", crate::VERSION)
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl {
        value: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or_else(|| ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        })
}
