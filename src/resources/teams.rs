//! `/api/v1/teams` and team membership.

use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::RequestExecutor;
use crate::client::CtfdResult;

/// Team as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Team {
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
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub captain_id: Option<u64>,
    #[serde(default)]
    pub members: Vec<u64>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub fields: Vec<Value>,
}

/// Payload for creating or updating a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub hidden: bool,
    pub banned: bool,
}

impl NewTeam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            password: None,
            website: None,
            affiliation: None,
            country: None,
            hidden: false,
            banned: false,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }
}

/// A user's membership of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct TeamMembership {
    pub team_id: u64,
    pub user_id: u64,
}

pub struct Teams<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> Teams<'a> {
    pub fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    pub async fn list(&self) -> CtfdResult<Vec<Team>> {
        self.executor.get("/api/v1/teams").await
    }

    pub async fn get(&self, id: u64) -> CtfdResult<Team> {
        self.executor.get(&format!("/api/v1/teams/{id}")).await
    }

    pub async fn create(&self, team: &NewTeam) -> CtfdResult<Team> {
        self.executor.send(Method::POST, "/api/v1/teams", team).await
    }

    pub async fn update(&self, id: u64, team: &NewTeam) -> CtfdResult<Team> {
        self.executor
            .send(Method::PATCH, &format!("/api/v1/teams/{id}"), team)
            .await
    }

    pub async fn delete(&self, id: u64) -> CtfdResult<()> {
        self.executor
            .send_empty(Method::DELETE, &format!("/api/v1/teams/{id}"), &json!({}))
            .await
    }

    pub async fn add_member(&self, team_id: u64, user_id: u64) -> CtfdResult<TeamMembership> {
        self.executor
            .send_empty(
                Method::POST,
                &format!("/api/v1/teams/{team_id}/members"),
                &json!({ "user_id": user_id }),
            )
            .await?;
        Ok(TeamMembership { team_id, user_id })
    }

    pub async fn remove_member(&self, team_id: u64, user_id: u64) -> CtfdResult<()> {
        self.executor
            .send_empty(
                Method::DELETE,
                &format!("/api/v1/teams/{team_id}/members"),
                &json!({ "user_id": user_id }),
            )
            .await
    }
}
