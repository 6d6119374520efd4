//! Reassembly of streamed tool-call fragments.
//!
//! Fragments are keyed by their position within the assistant turn. The
//! first id seen for a position sticks; name and argument text are
//! concatenated in arrival order.

use std::collections::BTreeMap;
use tracing::warn;
use vidscout_core::message::MessageToolCall;
use vidscout_core::provider::ToolCallDelta;

#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Collects one round's streamed text and tool-call fragments.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
    calls: BTreeMap<u32, PartialCall>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn apply(&mut self, delta: &ToolCallDelta) {
        let call = self.calls.entry(delta.index).or_default();
        if call.id.is_none() {
            if let Some(id) = delta.id.as_deref().filter(|id| !id.is_empty()) {
                call.id = Some(id.to_string());
            }
        }
        if let Some(name) = &delta.name {
            call.name.push_str(name);
        }
        if let Some(args) = &delta.arguments {
            call.arguments.push_str(args);
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    /// The buffered text and the completed calls in index order.
    ///
    /// Calls that never received an id get `call_<round>_<index>`; calls that
    /// never received a name are dropped.
    pub fn finish(self, round: u32) -> (String, Vec<MessageToolCall>) {
        let calls = self
            .calls
            .into_iter()
            .filter_map(|(index, call)| {
                let name = call.name.trim().to_string();
                if name.is_empty() {
                    warn!(round, index, "Dropping streamed tool call without a name");
                    return None;
                }
                Some(MessageToolCall {
                    id: call.id.unwrap_or_else(|| format!("call_{round}_{index}")),
                    name,
                    arguments: call.arguments,
                })
            })
            .collect();
        (self.text, calls)
    }
}
