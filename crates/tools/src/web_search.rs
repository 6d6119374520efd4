//! Web search tool: cached, rate-limited calls to the search backend.
//!
//! Identical queries inside the cache TTL are answered from the shared
//! cache without touching the backend.

use async_trait::async_trait;
use vidscout_core::error::ToolError;
use vidscout_core::limits::Dependency;
use vidscout_core::tool::{ServiceSlot, Tool, ToolContext, ToolResult, ToolServices};

pub const NAME: &str = "web_search";

const MAX_RESULTS_CAP: usize = 10;

#[derive(Default)]
pub struct WebSearchTool {
    services: ServiceSlot,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Case- and whitespace-insensitive form of a query, used in cache keys.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cache_key(query: &str, max_results: usize) -> String {
    format!("{NAME}:{max_results}:{}", normalize_query(query))
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Search the web for articles, news and background that videos alone cannot \
         answer. Returns titles, URLs and publication dates."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Number of results to return (default 5, max 10)",
                    "minimum": 1,
                    "maximum": MAX_RESULTS_CAP
                }
            },
            "required": ["query"]
        })
    }

    fn set_services(&self, services: &ToolServices) {
        self.services.set(services);
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("'query' must be a non-empty string".into()))?;

        let services = self.services.get(NAME)?;
        let settings = &services.settings;
        let max_results = arguments["max_results"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(settings.max_search_results)
            .clamp(1, MAX_RESULTS_CAP);

        let key = cache_key(query, max_results);
        if let Some(cached) = services.cache.get(&key) {
            if let Ok(data) = serde_json::from_str::<serde_json::Value>(&cached) {
                ctx.report(format!("Using cached results for \"{query}\""));
                return Ok(ToolResult::json(ctx, data));
            }
        }

        let backend = services.search_for(NAME)?;
        ctx.report(format!("Searching the web for \"{query}\""));

        let hits = services
            .caller
            .call(Dependency::WebSearch, Some(settings.search_timeout), || {
                backend.search(query, max_results)
            })
            .await
            .map_err(|e| ToolError::from_service(NAME, e))?;

        let data = serde_json::json!({
            "query": query,
            "count": hits.len(),
            "results": hits,
        });
        services
            .cache
            .set(key, data.to_string(), settings.search_ttl);

        Ok(ToolResult::json(ctx, data))
    }
}
