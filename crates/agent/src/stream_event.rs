//! Agent-level streaming events.
//!
//! `AgentEvent` is the closed set of progress notifications one task
//! produces, in strict temporal order. The gateway forwards each one to the
//! client as a single SSE `data:` frame.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Events emitted by the agent while a task runs.
///
/// Wire names (the `type` field):
/// - `round_start`: a new completion round begins
/// - `thinking`: reasoning text from a reasoning back-end
/// - `content`: answer text from the model
/// - `tool_start`: a tool call is about to execute
/// - `tool_progress`: a running tool reported a stage
/// - `tool_result`: a tool call finished (successfully or not)
/// - `batch_start`: same-tool calls are about to run in parallel
/// - `batch_complete`: the parallel batch finished
/// - `error`: the task hit a terminal failure
/// - `report_start`: the final report is being written
/// - `done`: the stream is complete; always the last event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    RoundStart {
        round: u32,
    },

    Thinking {
        text: String,
    },

    Content {
        text: String,
    },

    ToolStart {
        call_id: String,
        tool: String,
        args: serde_json::Value,
    },

    ToolProgress {
        call_id: String,
        tool: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },

    ToolResult {
        call_id: String,
        tool: String,
        success: bool,
        data: serde_json::Value,
    },

    BatchStart {
        tool: String,
        count: usize,
    },

    BatchComplete {
        total: usize,
        success: usize,
        /// Estimated tokens the batch results add to the context
        tokens: usize,
    },

    Error {
        message: String,
    },

    ReportStart,

    Done,
}

impl AgentEvent {
    /// Wire name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RoundStart { .. } => "round_start",
            Self::Thinking { .. } => "thinking",
            Self::Content { .. } => "content",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolProgress { .. } => "tool_progress",
            Self::ToolResult { .. } => "tool_result",
            Self::BatchStart { .. } => "batch_start",
            Self::BatchComplete { .. } => "batch_complete",
            Self::Error { .. } => "error",
            Self::ReportStart => "report_start",
            Self::Done => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// The event consumer hung up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerGone;

/// The single channel a task reports through.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::Sender<AgentEvent>,
}

impl EventEmitter {
    /// A connected emitter/stream pair.
    pub fn channel(capacity: usize) -> (Self, ReceiverStream<AgentEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, ReceiverStream::new(rx))
    }

    /// Deliver `event`, waiting if the consumer is behind.
    pub async fn emit(&self, event: AgentEvent) -> Result<(), ConsumerGone> {
        self.tx.send(event).await.map_err(|_| ConsumerGone)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[test]
    fn event_serialization_content() {
        let event = AgentEvent::Content {
            text: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"content","text":"Hello"}"#);
    }

    #[test]
    fn event_serialization_tool_start() {
        let event = AgentEvent::ToolStart {
            call_id: "call_1".into(),
            tool: "search_videos".into(),
            args: serde_json::json!({"keyword": "rust"}),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_start""#));
        assert!(json.contains(r#""tool":"search_videos""#));
    }

    #[test]
    fn unit_variants_serialize_as_bare_tags() {
        assert_eq!(serde_json::to_string(&AgentEvent::Done).unwrap(), r#"{"type":"done"}"#);
        assert_eq!(
            serde_json::to_string(&AgentEvent::ReportStart).unwrap(),
            r#"{"type":"report_start"}"#
        );
    }

    #[test]
    fn progress_omits_missing_data() {
        let event = AgentEvent::ToolProgress {
            call_id: "c".into(),
            tool: "analyze_video".into(),
            message: "Fetching subtitles".into(),
            data: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("data"));
    }

    #[test]
    fn event_type_matches_serde_tag() {
        let events = vec![
            AgentEvent::RoundStart { round: 1 },
            AgentEvent::Thinking { text: "t".into() },
            AgentEvent::BatchStart { tool: "x".into(), count: 2 },
            AgentEvent::BatchComplete { total: 2, success: 1, tokens: 10 },
            AgentEvent::Error { message: "boom".into() },
            AgentEvent::ReportStart,
            AgentEvent::Done,
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }

    #[test]
    fn event_deserialization() {
        let event: AgentEvent = serde_json::from_str(r#"{"type":"round_start","round":3}"#).unwrap();
        assert_eq!(event, AgentEvent::RoundStart { round: 3 });
    }

    #[tokio::test]
    async fn emitter_preserves_order() {
        let (emitter, mut stream) = EventEmitter::channel(8);
        emitter.emit(AgentEvent::RoundStart { round: 1 }).await.unwrap();
        emitter.emit(AgentEvent::Done).await.unwrap();
        drop(emitter);

        assert_eq!(stream.next().await, Some(AgentEvent::RoundStart { round: 1 }));
        assert_eq!(stream.next().await, Some(AgentEvent::Done));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn emit_fails_once_consumer_is_gone() {
        let (emitter, stream) = EventEmitter::channel(8);
        drop(stream);
        assert!(emitter.is_closed());
        assert_eq!(emitter.emit(AgentEvent::Done).await, Err(ConsumerGone));
    }
}
