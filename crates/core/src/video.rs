//! Video-platform collaborator contract.
//!
//! The agent never talks to a platform API directly; tools go through this
//! trait, injected via [`crate::tool::ToolServices`]. Only the fields the
//! tools actually surface to the model are modelled here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ServiceError;

/// A search hit or listing entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub duration_secs: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub url: String,
}

/// Full metadata for one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub summary: VideoSummary,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comment_count: u64,
}

/// One timed subtitle line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleLine {
    pub from: f64,
    pub to: f64,
    pub text: String,
}

/// A viewer comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub likes: u64,
}

/// A reference to an extracted still frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub timestamp_secs: f64,
    pub url: String,
}

/// A creator profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub recent_videos: Vec<VideoSummary>,
}

/// The operations tools need from a video platform.
///
/// Implementations must be safe to call concurrently (batch execution).
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, keyword: &str, limit: usize, order: Option<&str>)
        -> Result<Vec<VideoSummary>, ServiceError>;

    async fn video(&self, video_id: &str) -> Result<VideoDetail, ServiceError>;

    async fn subtitles(&self, video_id: &str) -> Result<Vec<SubtitleLine>, ServiceError>;

    async fn comments(&self, video_id: &str, limit: usize) -> Result<Vec<Comment>, ServiceError>;

    async fn frames(&self, video_id: &str, count: usize) -> Result<Vec<Frame>, ServiceError>;

    /// Look a creator up by id or by display name.
    async fn user(&self, id_or_name: &str) -> Result<UserProfile, ServiceError>;
}
