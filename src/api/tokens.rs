//! API token discovery and provisioning.
//!
//! Tokens are not unique per purpose on the platform and nothing expires
//! them for us, so an existing administrator token is reused before a new
//! one is minted.

use std::fmt;

use chrono::Utc;
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::executor::RequestExecutor;
use crate::client::CtfdResult;
use crate::events::{ClientEvent, TokenEvent};

/// Identifier the platform assigns to the account created by first-run setup.
pub const PRIMARY_ADMIN_ID: u64 = 1;

const TOKENS_PATH: &str = "/api/v1/tokens";

/// API token as returned by `/api/v1/tokens`. Listings omit `value`.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiToken {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub token_type: Option<String>,
    pub user_id: u64,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiToken")
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("user_id", &self.user_id)
            .field("created", &self.created)
            .field("expiration", &self.expiration)
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Finds or creates the administrator's API token over the cookie session.
pub struct TokenProvisioner<'a> {
    executor: &'a mut RequestExecutor,
    admin_user_id: u64,
}

impl<'a> TokenProvisioner<'a> {
    pub fn new(executor: &'a mut RequestExecutor, admin_user_id: u64) -> Self {
        Self {
            executor,
            admin_user_id,
        }
    }

    /// Scan existing tokens for one owned by the administrator, creating a
    /// token only when none is usable. The result is installed on the
    /// executor as its credential.
    ///
    /// A detail record without a `value` cannot authenticate and is skipped.
    /// If the administrator does not hold `admin_user_id`, the scan finds
    /// nothing and a fresh token is created on every run.
    pub async fn get_or_create_token(mut self) -> CtfdResult<ApiToken> {
        let listed: Vec<ApiToken> = self
            .executor
            .session_json(Method::GET, TOKENS_PATH, None)
            .await?;

        for summary in listed {
            let detail: ApiToken = self
                .executor
                .session_json(Method::GET, &format!("{TOKENS_PATH}/{}", summary.id), None)
                .await?;

            if detail.user_id != self.admin_user_id {
                continue;
            }
            if detail.value.is_none() {
                log::debug!("token {} has no retrievable value; skipping", detail.id);
                continue;
            }
            return Ok(self.adopt(detail, false));
        }

        let created: ApiToken = self
            .executor
            .session_json(Method::POST, TOKENS_PATH, Some(&json!({})))
            .await?;
        Ok(self.adopt(created, true))
    }

    fn adopt(mut self, token: ApiToken, created: bool) -> ApiToken {
        self.executor
            .sessions()
            .events()
            .dispatch(ClientEvent::TokenAdopted(TokenEvent {
                token_id: token.id,
                user_id: token.user_id,
                created,
                timestamp: Utc::now(),
            }));
        self.executor.adopt_token(token.clone());
        token
    }
}
