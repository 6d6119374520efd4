//! Error types for the vidscout domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::time::Duration;
use thiserror::Error;

/// The top-level error type for all vidscout operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- External service errors ---
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Report storage errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies an error as transient (worth retrying) or terminal.
///
/// Implemented by every error that can come back from an outbound call
/// wrapped in [`crate::retry::RetryingCaller`].
pub trait Retryable: std::error::Error + Send + Sync + 'static {
    /// Whether another attempt could plausibly succeed.
    fn is_retryable(&self) -> bool;

    /// The error to report when a single attempt exceeds its timeout.
    fn timed_out(after: Duration) -> Self;
}

/// HTTP status codes treated as transient.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::ApiError { status_code, .. } => is_retryable_status(*status_code),
            Self::RateLimited { .. } | Self::Timeout(_) => true,
            _ => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        Self::Timeout(format!("no response after {}s", after.as_secs_f32()))
    }
}

/// Errors from the non-LLM external services (video platform, web search).
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("{service} returned HTTP {status}: {message}")]
    Http {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service not configured: {0}")]
    NotConfigured(String),
}

impl Retryable for ServiceError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => is_retryable_status(*status),
            Self::Timeout(_) => true,
            _ => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        Self::Timeout(format!("no response after {}s", after.as_secs_f32()))
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool {tool_name} failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Missing required argument(s) for {tool_name}: {}", .missing.join(", "))]
    MissingArguments {
        tool_name: String,
        missing: Vec<String>,
    },

    #[error("Service unavailable for {tool_name}: {reason}")]
    ServiceUnavailable { tool_name: String, reason: String },
}

impl ToolError {
    /// Wrap an external service failure as a failure of the given tool.
    pub fn from_service(tool_name: &str, err: ServiceError) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid report topic: {0}")]
    InvalidTopic(String),
}
