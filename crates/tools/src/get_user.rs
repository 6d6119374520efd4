//! Creator lookup by id or display name.

use async_trait::async_trait;
use vidscout_core::error::{ServiceError, ToolError};
use vidscout_core::tool::{ServiceSlot, Tool, ToolContext, ToolResult, ToolServices};

pub const NAME: &str = "get_user";

#[derive(Default)]
pub struct GetUserTool {
    services: ServiceSlot,
}

impl GetUserTool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tool for GetUserTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Look up a creator by id or name. Returns profile, follower count and recent uploads."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user": {
                    "type": "string",
                    "description": "Creator id or display name"
                }
            },
            "required": ["user"]
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
        let user = arguments["user"]
            .as_str()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("'user' must be a non-empty string".into()))?;

        let services = self.services.get(NAME)?;
        let video = services.video_for(NAME)?;
        ctx.report(format!("Looking up creator \"{user}\""));

        let profile = services
            .caller
            .retry(Some(services.settings.metadata_timeout), || video.user(user))
            .await
            .map_err(|e| match e {
                ServiceError::NotFound(_) => ToolError::ExecutionFailed {
                    tool_name: NAME.into(),
                    reason: format!("no creator matches \"{user}\""),
                },
                other => ToolError::from_service(NAME, other),
            })?;

        let data = serde_json::to_value(&profile)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: NAME.into(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult::json(ctx, data))
    }
}
