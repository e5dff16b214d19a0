//! Read-only `/api/v1/challenges` listing.

use serde::{Deserialize, Serialize};

use crate::api::RequestExecutor;
use crate::client::CtfdResult;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tag {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Challenge {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub challenge_type: String,
    pub name: String,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub solves: Option<u64>,
    #[serde(default)]
    pub solved_by_me: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

pub struct Challenges<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> Challenges<'a> {
    pub fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    pub async fn list(&self) -> CtfdResult<Vec<Challenge>> {
        self.executor.get("/api/v1/challenges").await
    }
}
