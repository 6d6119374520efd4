//! Shared test helpers: a scripted streaming provider, toy tools and an
//! in-memory report store.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use vidscout_core::error::{ProviderError, StorageError, ToolError};
use vidscout_core::message::Message;
use vidscout_core::provider::*;
use vidscout_core::report::ReportStore;
use vidscout_core::tool::{Tool, ToolContext, ToolResult};

use crate::stream_event::AgentEvent;

/// One scripted completion.
pub enum Turn {
    /// Stream these chunks, then end
    Chunks(Vec<StreamChunk>),
    /// Refuse to open the stream
    OpenError(ProviderError),
    /// Stream these chunks, then fail
    Broken(Vec<StreamChunk>, ProviderError),
}

fn split_mid(s: &str) -> (&str, &str) {
    let mid = s.char_indices().nth(s.chars().count() / 2).map_or(s.len(), |(i, _)| i);
    s.split_at(mid)
}

/// A text answer streamed in two fragments.
pub fn text_turn(text: &str) -> Turn {
    let (head, tail) = split_mid(text);
    Turn::Chunks(vec![
        StreamChunk::text(head),
        StreamChunk::text(tail),
        StreamChunk::finished(None),
    ])
}

/// Reasoning followed by an answer.
pub fn reasoning_turn(reasoning: &str, text: &str) -> Turn {
    Turn::Chunks(vec![
        StreamChunk::reasoning(reasoning),
        StreamChunk::text(text),
        StreamChunk::finished(None),
    ])
}

/// Tool calls `(id, name, raw_args)`, each streamed as two fragments the
/// way OpenAI-compatible back-ends split them.
pub fn tool_turn(calls: &[(&str, &str, &str)]) -> Turn {
    let mut chunks = Vec::new();
    for (index, (id, name, args)) in calls.iter().enumerate() {
        let (head, tail) = split_mid(args);
        chunks.push(StreamChunk::tool_delta(ToolCallDelta {
            index: index as u32,
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            arguments: Some(head.to_string()),
        }));
        chunks.push(StreamChunk::tool_delta(ToolCallDelta {
            index: index as u32,
            id: None,
            name: None,
            arguments: Some(tail.to_string()),
        }));
    }
    chunks.push(StreamChunk::finished(None));
    Turn::Chunks(chunks)
}

/// Replays scripted turns and records every request it receives.
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Turn>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_turn(&self, request: ProviderRequest) -> Option<Turn> {
        self.requests.lock().unwrap().push(request);
        self.turns.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        match self.next_turn(request) {
            Some(Turn::Chunks(chunks)) => {
                let text: String = chunks.into_iter().filter_map(|c| c.content).collect();
                Ok(ProviderResponse {
                    message: Message::assistant(text),
                    usage: None,
                    model: "scripted".into(),
                })
            }
            Some(Turn::OpenError(e)) | Some(Turn::Broken(_, e)) => Err(e),
            None => Err(ProviderError::NotConfigured("script exhausted".into())),
        }
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let (chunks, failure) = match self.next_turn(request) {
            Some(Turn::Chunks(chunks)) => (chunks, None),
            Some(Turn::Broken(chunks, e)) => (chunks, Some(e)),
            Some(Turn::OpenError(e)) => return Err(e),
            None => return Err(ProviderError::NotConfigured("script exhausted".into())),
        };
        let (tx, rx) = mpsc::channel(chunks.len() + 1);
        for chunk in chunks {
            let _ = tx.send(Ok(chunk)).await;
        }
        if let Some(e) = failure {
            let _ = tx.send(Err(e)).await;
        }
        Ok(rx)
    }
}

/// Streams one fragment, then goes silent with the stream still open.
#[derive(Default)]
pub struct StallingProvider {
    held: Mutex<Vec<mpsc::Sender<Result<StreamChunk, ProviderError>>>>,
}

#[async_trait]
impl Provider for StallingProvider {
    fn name(&self) -> &str {
        "stalling"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("stream only".into()))
    }

    async fn stream(&self, _request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let (tx, rx) = mpsc::channel(4);
        let _ = tx.send(Ok(StreamChunk::text("partial"))).await;
        self.held.lock().unwrap().push(tx);
        Ok(rx)
    }
}

/// Echoes its `text` argument after an optional `delay_ms`, reporting one
/// progress note. Records completion order.
pub struct EchoTool {
    name: String,
    strict: bool,
    completed: Mutex<Vec<String>>,
}

impl EchoTool {
    /// Requires `text`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            strict: true,
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Accepts a missing `text`.
    pub fn lenient(name: &str) -> Self {
        Self {
            strict: false,
            ..Self::new(name)
        }
    }

    pub fn finished(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Echo the given text"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        let required: Vec<&str> = if self.strict { vec!["text"] } else { vec![] };
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": { "type": "string" },
                "delay_ms": { "type": "integer" }
            },
            "required": required
        })
    }

    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let text = arguments["text"].as_str().unwrap_or("(no text)").to_string();
        ctx.report(format!("echoing {text}"));
        if let Some(ms) = arguments["delay_ms"].as_u64() {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        self.completed.lock().unwrap().push(text.clone());
        Ok(ToolResult::text(ctx, text))
    }
}

/// Panics unless called with `calm: true`.
pub struct PanickyTool;

#[async_trait]
impl Tool for PanickyTool {
    fn name(&self) -> &str {
        "panicky"
    }

    fn description(&self) -> &str {
        "Panics on demand"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": { "calm": { "type": "boolean" } } })
    }

    async fn execute(&self, arguments: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        if arguments["calm"].as_bool() != Some(true) {
            panic!("panicky tool lost its temper");
        }
        Ok(ToolResult::text(ctx, "calm"))
    }
}

/// Keeps saved reports in memory, or refuses every save.
#[derive(Default)]
pub struct MemoryReportStore {
    fail: bool,
    saved: Mutex<Vec<(String, String)>>,
}

impl MemoryReportStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<(String, String)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn save(&self, topic: &str, content: &str) -> Result<PathBuf, StorageError> {
        if self.fail {
            return Err(StorageError::Io {
                path: "/nowhere".into(),
                reason: "disk full".into(),
            });
        }
        self.saved
            .lock()
            .unwrap()
            .push((topic.to_string(), content.to_string()));
        Ok(PathBuf::from(format!("/reports/{topic}.md")))
    }
}

pub async fn collect(stream: ReceiverStream<AgentEvent>) -> Vec<AgentEvent> {
    stream.collect().await
}

/// Concatenated `content` text.
pub fn content_of(events: &[AgentEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            AgentEvent::Content { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

pub fn count(events: &[AgentEvent], event_type: &str) -> usize {
    events.iter().filter(|e| e.event_type() == event_type).count()
}

pub fn position(events: &[AgentEvent], event_type: &str) -> Option<usize> {
    events.iter().position(|e| e.event_type() == event_type)
}
