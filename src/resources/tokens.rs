//! Read-only token listing over the structured API.

use crate::api::{ApiToken, RequestExecutor};
use crate::client::CtfdResult;

pub struct Tokens<'a> {
    executor: &'a RequestExecutor,
}

impl<'a> Tokens<'a> {
    pub fn new(executor: &'a RequestExecutor) -> Self {
        Self { executor }
    }

    pub async fn list(&self) -> CtfdResult<Vec<ApiToken>> {
        self.executor.get("/api/v1/tokens").await
    }

    pub async fn get(&self, id: u64) -> CtfdResult<ApiToken> {
        self.executor.get(&format!("/api/v1/tokens/{id}")).await
    }
}
