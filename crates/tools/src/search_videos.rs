//! Keyword search over the video platform.

use async_trait::async_trait;
use vidscout_core::error::ToolError;
use vidscout_core::tool::{ServiceSlot, Tool, ToolContext, ToolResult, ToolServices};

pub const NAME: &str = "search_videos";

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;
const ORDERS: [&str; 3] = ["relevance", "views", "date"];

#[derive(Default)]
pub struct SearchVideosTool {
    services: ServiceSlot,
}

impl SearchVideosTool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tool for SearchVideosTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Search the video platform by keyword. Returns id, title, author, duration, \
         view count and publish date for each match."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "keyword": {
                    "type": "string",
                    "description": "Search keyword or phrase"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of videos (default 10, max 50)",
                    "minimum": 1,
                    "maximum": MAX_LIMIT
                },
                "order": {
                    "type": "string",
                    "description": "Sort order",
                    "enum": ORDERS
                }
            },
            "required": ["keyword"]
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
        let keyword = arguments["keyword"]
            .as_str()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("'keyword' must be a non-empty string".into()))?;

        let limit = arguments["limit"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        let order = match arguments["order"].as_str() {
            None => None,
            Some(o) if ORDERS.contains(&o) => Some(o),
            Some(o) => {
                return Err(ToolError::InvalidArguments(format!(
                    "unknown order '{o}', expected one of {}",
                    ORDERS.join(", ")
                )));
            }
        };

        let services = self.services.get(NAME)?;
        let video = services.video_for(NAME)?;
        ctx.report(format!("Searching videos for \"{keyword}\""));

        let videos = services
            .caller
            .retry(Some(services.settings.metadata_timeout), || {
                video.search(keyword, limit, order)
            })
            .await
            .map_err(|e| ToolError::from_service(NAME, e))?;

        Ok(ToolResult::json(
            ctx,
            serde_json::json!({
                "keyword": keyword,
                "count": videos.len(),
                "videos": videos,
            }),
        ))
    }
}
