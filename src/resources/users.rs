//! `/api/v1/users`

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::RequestExecutor;
use crate::client::CtfdResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    User,
    Admin,
}

/// User as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub bracket: Option<String>,
    #[serde(rename = "type", default)]
    pub user_type: UserType,
    #[serde(default)]
    pub team_id: Option<u64>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub fields: Vec<Value>,
}

/// Payload for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub verified: bool,
    pub hidden: bool,
    pub banned: bool,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            website: None,
            affiliation: None,
            country: None,
            user_type: UserType::User,
            verified: false,
            hidden: false,
            banned: false,
        }
    }
}

/// Payload for updating a user. Passwords cannot be changed through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateUser {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub verified: bool,
    pub hidden: bool,
    pub banned: bool,
}

impl From<NewUser> for UpdateUser {
    fn from(user: NewUser) -> Self {
        Self {
            name: user.name,
            email: user.email,
            website: user.website,
            affiliation: user.affiliation,
            country: user.country,
            user_type: user.user_type,
            verified: user.verified,
            hidden: user.hidden,
            banned: user.banned,
        }
    }
}

pub struct Users<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> Users<'a> {
    pub fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    pub async fn list(&self) -> CtfdResult<Vec<User>> {
        self.executor.get("/api/v1/users").await
    }

    pub async fn get(&self, id: u64) -> CtfdResult<User> {
        self.executor.get(&format!("/api/v1/users/{id}")).await
    }

    pub async fn create(&self, user: &NewUser) -> CtfdResult<User> {
        self.executor.send(Method::POST, "/api/v1/users", user).await
    }

    pub async fn update(&self, id: u64, user: &UpdateUser) -> CtfdResult<User> {
        self.executor
            .send(Method::PATCH, &format!("/api/v1/users/{id}"), user)
            .await
    }

    pub async fn delete(&self, id: u64) -> CtfdResult<()> {
        self.executor
            .send_empty(Method::DELETE, &format!("/api/v1/users/{id}"), &json!({}))
            .await
    }
}
