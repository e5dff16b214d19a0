//! Setup inputs and the read-back view of an instance's configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::{CtfdError, CtfdResult};

/// Everything first-run setup needs. Consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SetupSpec {
    pub name: String,
    pub description: String,
    pub admin_email: String,
    /// Import bundle (CTFd export archive) on local disk.
    pub configuration_path: PathBuf,
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

impl SetupSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        admin_email: impl Into<String>,
        configuration_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            admin_email: admin_email.into(),
            configuration_path: configuration_path.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: EmailConfig) -> Self {
        self.email = Some(email);
        self
    }

    /// Load a spec from a JSON document on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> CtfdResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| CtfdError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// Outbound mail relay settings.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmailConfig {
    pub server: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub from_address: Option<String>,
    #[serde(default)]
    pub use_auth: bool,
    #[serde(default)]
    pub use_tls: Option<bool>,
    #[serde(default)]
    pub use_ssl: Option<bool>,
}

impl EmailConfig {
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            username: None,
            password: None,
            from_address: None,
            use_auth: false,
            use_tls: None,
            use_ssl: None,
        }
    }

    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.use_auth = true;
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_from_address(mut self, from_address: impl Into<String>) -> Self {
        self.from_address = Some(from_address.into());
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = Some(use_tls);
        self
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = Some(use_ssl);
        self
    }

    /// Body for `PATCH /api/v1/configs`. Unset optional fields are left out
    /// so existing server values survive.
    pub fn to_config_patch(&self) -> Value {
        let mut patch = Map::new();
        patch.insert("mail_server".into(), Value::from(self.server.clone()));
        patch.insert("mail_port".into(), Value::from(self.port));
        patch.insert("mail_useauth".into(), Value::from(self.use_auth));

        let optional = [
            ("mail_username", self.username.clone().map(Value::from)),
            ("mail_password", self.password.clone().map(Value::from)),
            ("mailfrom_addr", self.from_address.clone().map(Value::from)),
            ("mail_tls", self.use_tls.map(Value::from)),
            ("mail_ssl", self.use_ssl.map(Value::from)),
        ];
        for (key, value) in optional
            .into_iter()
            .filter_map(|(key, value)| value.map(|value| (key, value)))
        {
            patch.insert(key.into(), value);
        }

        Value::Object(patch)
    }
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from_address", &self.from_address)
            .field("use_auth", &self.use_auth)
            .field("use_tls", &self.use_tls)
            .field("use_ssl", &self.use_ssl)
            .finish()
    }
}

/// Single row of `/api/v1/configs`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConfigEntry {
    pub id: u64,
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// Current setup as reported by the config API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CtfdSetup {
    pub name: String,
    pub description: String,
}

impl CtfdSetup {
    pub fn from_entries(entries: &[ConfigEntry]) -> Self {
        let mut setup = CtfdSetup::default();
        for entry in entries {
            let value = match &entry.value {
                Value::String(text) => text.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            match entry.key.as_str() {
                "ctf_name" => setup.name = value,
                "ctf_description" => setup.description = value,
                _ => {}
            }
        }
        setup
    }
}
