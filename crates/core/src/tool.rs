//! Tool trait and registry: the abstraction over agent capabilities.
//!
//! Tools are what let the model gather evidence: search videos, analyze a
//! video in depth, search the web, look up a creator, or signal that the
//! research is complete. Each tool declares a JSON-schema signature and an
//! async executor; the [`ToolRegistry`] is the single source of truth for
//! which tools exist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::cache::TtlCache;
use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::{Provider, ToolDefinition};
use crate::retry::RetryingCaller;
use crate::search::SearchBackend;
use crate::video::VideoPlatform;

/// A request to execute a tool, with its arguments already parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a key/value map
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl From<&MessageToolCall> for ToolCall {
    fn from(tc: &MessageToolCall) -> Self {
        Self {
            id: tc.id.clone(),
            name: tc.name.clone(),
            arguments: tc.parsed_arguments(),
        }
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The text handed back to the model
    pub output: String,

    /// Optional structured data (forwarded to the client as the result payload)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// A successful result whose model-facing text is the pretty-printed data.
    pub fn json(ctx: &ToolContext, data: serde_json::Value) -> Self {
        let output = serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string());
        Self {
            call_id: ctx.call_id.clone(),
            success: true,
            output,
            data: Some(data),
        }
    }

    /// A successful plain-text result.
    pub fn text(ctx: &ToolContext, output: impl Into<String>) -> Self {
        Self {
            call_id: ctx.call_id.clone(),
            success: true,
            output: output.into(),
            data: None,
        }
    }
}

/// A progress note emitted by a running tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolProgress {
    pub call_id: String,
    pub tool: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Per-call execution context handed to [`Tool::execute`].
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub call_id: String,
    pub tool: String,
    progress: Option<mpsc::UnboundedSender<ToolProgress>>,
}

impl ToolContext {
    pub fn new(call_id: impl Into<String>, tool: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            tool: tool.into(),
            progress: None,
        }
    }

    /// Route progress notes to `sink`.
    pub fn with_progress(mut self, sink: mpsc::UnboundedSender<ToolProgress>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Report a progress message. Silently dropped if nobody listens.
    pub fn report(&self, message: impl Into<String>) {
        self.report_with(message, None);
    }

    /// Report a progress message with structured detail.
    pub fn report_with(&self, message: impl Into<String>, data: Option<serde_json::Value>) {
        if let Some(sink) = &self.progress {
            let _ = sink.send(ToolProgress {
                call_id: self.call_id.clone(),
                tool: self.tool.clone(),
                message: message.into(),
                data,
            });
        }
    }
}

/// Tunables the built-in tools read from their injected services.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub search_ttl: Duration,
    pub search_timeout: Duration,
    pub metadata_timeout: Duration,
    pub max_search_results: usize,
    pub comment_limit: usize,
    pub frame_count: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            search_ttl: Duration::from_secs(600),
            search_timeout: Duration::from_secs(15),
            metadata_timeout: Duration::from_secs(20),
            max_search_results: 5,
            comment_limit: 20,
            frame_count: 4,
        }
    }
}

/// Shared clients injected into every registered tool.
///
/// Tools never construct their own clients; whatever is missing here makes
/// the dependent tool fail with a descriptive error instead.
#[derive(Clone, Default)]
pub struct ToolServices {
    pub video: Option<Arc<dyn VideoPlatform>>,
    pub search: Option<Arc<dyn SearchBackend>>,
    pub completion: Option<Arc<dyn Provider>>,
    pub completion_model: String,
    pub cache: Arc<TtlCache<String>>,
    pub caller: RetryingCaller,
    pub settings: ToolSettings,
}

impl ToolServices {
    pub fn new(caller: RetryingCaller) -> Self {
        Self {
            caller,
            ..Self::default()
        }
    }

    pub fn with_video(mut self, video: Arc<dyn VideoPlatform>) -> Self {
        self.video = Some(video);
        self
    }

    pub fn with_search(mut self, search: Arc<dyn SearchBackend>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_completion(mut self, provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        self.completion = Some(provider);
        self.completion_model = model.into();
        self
    }

    pub fn with_cache(mut self, cache: Arc<TtlCache<String>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_settings(mut self, settings: ToolSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn video_for(&self, tool_name: &str) -> Result<Arc<dyn VideoPlatform>, ToolError> {
        self.video.clone().ok_or_else(|| ToolError::ServiceUnavailable {
            tool_name: tool_name.to_string(),
            reason: "no video platform configured".into(),
        })
    }

    pub fn search_for(&self, tool_name: &str) -> Result<Arc<dyn SearchBackend>, ToolError> {
        self.search.clone().ok_or_else(|| ToolError::ServiceUnavailable {
            tool_name: tool_name.to_string(),
            reason: "no search backend configured".into(),
        })
    }
}

/// Holds the services a tool received through [`Tool::set_services`].
#[derive(Default)]
pub struct ServiceSlot {
    inner: RwLock<Option<ToolServices>>,
}

impl ServiceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, services: &ToolServices) {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(services.clone());
    }

    /// The injected services, or an error naming the tool that lacks them.
    pub fn get(&self, tool_name: &str) -> Result<ToolServices, ToolError> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| ToolError::ServiceUnavailable {
                tool_name: tool_name.to_string(),
                reason: "services were never injected".into(),
            })
    }
}

/// The core Tool trait.
///
/// Implementations must be safe to run concurrently with other tools and
/// with themselves: a batch round executes several calls to the same tool
/// in parallel.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "web_search").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Argument names that must be present before the tool runs.
    fn required_arguments(&self) -> Vec<String> {
        self.parameters_schema()["required"]
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Receive shared clients. Tools with no external dependencies ignore this.
    fn set_services(&self, _services: &ToolServices) {}

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, built per agent instance.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces (with a warning) any tool of the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Tool re-registered, previous definition replaced");
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Definitions of every registered tool, sorted by name.
    pub fn schemas(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Inject shared services into every registered tool.
    pub fn set_services(&self, services: &ToolServices) {
        for tool in self.tools.values() {
            tool.set_services(services);
        }
    }

    /// Validate required arguments, then run the named tool.
    pub async fn execute(
        &self,
        name: &str,
        arguments: serde_json::Map<String, serde_json::Value>,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let missing: Vec<String> = tool
            .required_arguments()
            .into_iter()
            .filter(|arg| arguments.get(arg).is_none_or(|v| v.is_null()))
            .collect();
        if !missing.is_empty() {
            return Err(ToolError::MissingArguments {
                tool_name: name.to_string(),
                missing,
            });
        }

        tool.execute(serde_json::Value::Object(arguments), ctx).await
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
