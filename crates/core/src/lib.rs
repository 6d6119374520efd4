//! # vidscout Core
//!
//! Domain types, traits, and error definitions for the vidscout research agent.
//! This crate has no HTTP or runtime framework dependencies: it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (completion backend, video platform, web search,
//! report storage) is a trait here. Implementations live in their respective
//! crates, and tests swap in scripted fakes.

pub mod cache;
pub mod error;
pub mod limits;
pub mod message;
pub mod provider;
pub mod report;
pub mod retry;
pub mod search;
pub mod tool;
pub mod video;

// Re-export key types at crate root for ergonomics
pub use cache::TtlCache;
pub use error::{Error, ProviderError, Result, Retryable, ServiceError, StorageError, ToolError};
pub use limits::{ConcurrencyLimits, Dependency, Permit};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{ChunkReceiver, Provider, ProviderRequest, ProviderResponse, StreamChunk, ToolCallDelta, ToolDefinition, Usage};
pub use report::ReportStore;
pub use retry::{RetryPolicy, RetryingCaller};
pub use search::{SearchBackend, SearchHit};
pub use tool::{ServiceSlot, Tool, ToolCall, ToolContext, ToolProgress, ToolRegistry, ToolResult, ToolServices, ToolSettings};
pub use video::{Comment, Frame, SubtitleLine, UserProfile, VideoDetail, VideoPlatform, VideoSummary};
