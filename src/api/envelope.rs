//! The JSON envelope wrapping every structured API response.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{CtfdError, CtfdResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub next: Option<u64>,
    pub prev: Option<u64>,
    pub pages: u64,
    pub per_page: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Meta {
    pub pagination: Pagination,
}

/// `{ success, message, data }` as returned by `/api/v1/*`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub errors: Option<Value>,
}

impl ApiEnvelope {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Best available human message: `message`, else the flattened `errors`
    /// object the platform sends on validation failures.
    pub fn describe(&self) -> String {
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return message.to_string();
        }
        match &self.errors {
            Some(Value::Object(fields)) => fields
                .iter()
                .map(|(field, reason)| format!("{field}: {}", flatten(reason)))
                .collect::<Vec<_>>()
                .join("; "),
            Some(other) => flatten(other),
            None => "request was not successful".to_string(),
        }
    }

    /// Decode the payload into `T`, failing when `success` is false.
    ///
    /// A missing `data` field decodes as JSON `null`, which suits `()` and
    /// `Option<_>` targets.
    pub fn into_data<T: DeserializeOwned>(self, status: u16) -> CtfdResult<T> {
        if !self.success {
            return Err(CtfdError::Api {
                status,
                message: self.describe(),
            });
        }
        Ok(serde_json::from_value(self.data.unwrap_or(Value::Null))?)
    }
}

fn flatten(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
