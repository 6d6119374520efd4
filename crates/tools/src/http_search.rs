//! JSON web-search API client.
//!
//! `POST {api_url}` with `{"query", "max_results"}` and bearer auth;
//! the response is `{"results": [{"title", "url", "published_date"}]}`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use vidscout_core::error::ServiceError;
use vidscout_core::search::{SearchBackend, SearchHit};

use crate::http::{build_client, read_json, transport_error};

const SERVICE: &str = "web search";

pub struct HttpSearchBackend {
    api_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpSearchBackend {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key,
            client: build_client(),
        }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ServiceError> {
        debug!(query = %query, max_results, "Web search request");

        let mut request = self.client.post(&self.api_url).json(&serde_json::json!({
            "query": query,
            "max_results": max_results,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        let body: SearchResponse = read_json(SERVICE, response).await?;

        let mut hits = body.results;
        hits.truncate(max_results);
        Ok(hits)
    }
}
