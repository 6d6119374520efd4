//! Web-search collaborator contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ServiceError;

/// One web search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// A search backend. Identical queries must be idempotent so results can
/// be cached.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ServiceError>;
}
