//! The termination tool.
//!
//! Calling it ends evidence gathering; the agent loop recognizes it by
//! name and switches to writing the final report.

use async_trait::async_trait;
use vidscout_core::error::ToolError;
use vidscout_core::tool::{Tool, ToolContext, ToolResult};

pub const NAME: &str = "finish_research";

pub struct FinishResearchTool;

#[async_trait]
impl Tool for FinishResearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Call this once you have gathered enough evidence to write the final research \
         report. Optionally pass a short summary of what was found."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "One-paragraph summary of the findings"
                }
            }
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let summary = arguments["summary"].as_str().unwrap_or_default().trim();
        let mut result = ToolResult::text(ctx, "Research complete. Write the final report next.");
        result.data = Some(serde_json::json!({ "summary": summary }));
        Ok(result)
    }
}
