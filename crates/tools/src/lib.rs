//! Research tools and service clients for vidscout.
//!
//! Tools give the agent its evidence: video search, in-depth video
//! analysis, web search, creator lookup, and the `finish_research`
//! termination signal. The HTTP clients here implement the core
//! `VideoPlatform`, `SearchBackend` and `ReportStore` contracts.

pub mod analyze_video;
pub mod finish_research;
pub mod get_user;
mod http;
pub mod http_search;
pub mod http_video;
pub mod report_store;
pub mod search_videos;
pub mod web_search;

#[cfg(test)]
mod fakes;

use std::sync::Arc;
use vidscout_core::tool::ToolRegistry;

pub use finish_research::NAME as FINISH_TOOL;
pub use http_search::HttpSearchBackend;
pub use http_video::HttpVideoPlatform;
pub use report_store::FileReportStore;

/// The evidence-gathering tools shared by every task kind.
pub fn interactive_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(search_videos::SearchVideosTool::new()));
    registry.register(Arc::new(analyze_video::AnalyzeVideoTool::new()));
    registry.register(Arc::new(web_search::WebSearchTool::new()));
    registry.register(Arc::new(get_user::GetUserTool::new()));
    registry
}

/// Every tool, including the termination tool.
pub fn research_registry() -> ToolRegistry {
    let mut registry = interactive_registry();
    registry.register(Arc::new(finish_research::FinishResearchTool));
    registry
}
