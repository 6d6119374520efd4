//! Task kinds, requests, and the fixed prompts the loop injects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which flavor of task the loop is driving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// A short question answered in a few rounds
    #[default]
    Interactive,
    /// Long-form research that ends with a written report
    Research,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Research => "research",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Interactive => INTERACTIVE_PROMPT,
            Self::Research => RESEARCH_PROMPT,
        }
    }

    /// Research keeps going until the model calls the termination tool.
    pub fn runs_until_finished(&self) -> bool {
        matches!(self, Self::Research)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interactive" | "ask" => Ok(Self::Interactive),
            "research" => Ok(Self::Research),
            other => Err(format!("unknown task kind '{other}' (expected interactive or research)")),
        }
    }
}

/// One task submitted to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub task: String,

    #[serde(default)]
    pub kind: TaskKind,

    /// Caller-supplied background, free text or structured JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl TaskRequest {
    pub fn new(kind: TaskKind, task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// The first user message of the conversation.
    pub fn user_message(&self) -> String {
        let context = match &self.context {
            None | Some(serde_json::Value::Null) => return self.task.clone(),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => return self.task.clone(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        format!("{}\n\nAdditional context:\n{context}", self.task)
    }
}

const INTERACTIVE_PROMPT: &str = "You are vidscout, an assistant that answers questions \
about online video content. Use search_videos to find relevant videos, analyze_video to \
study the most promising ones, get_user to look up creators and web_search for background \
the videos cannot provide. When several videos need the same analysis, request all the \
calls in one turn. Answer concisely and cite the videos you relied on by title.";

const RESEARCH_PROMPT: &str = "You are vidscout, a research agent that builds evidence-based \
reports from online video content. Work in rounds: search broadly, analyze the strongest \
videos in depth (request several analyze_video calls in one turn when possible), check \
creators with get_user and fill gaps with web_search. Keep gathering until the evidence \
covers the topic from several angles, then call finish_research with a short summary of \
what you found. Do not write the report before calling finish_research.";

/// Injected on the final allowed round.
pub const FORCED_ANSWER_NUDGE: &str = "You have reached the maximum number of tool rounds. \
Do not call any more tools. Answer now using only the information already gathered.";

/// Injected when a research round ends without tool calls.
pub const CONTINUE_NUDGE: &str = "Continue the research. Call more tools to gather evidence, \
or call finish_research when the evidence is sufficient.";

/// Injected before the final report completion.
pub const REPORT_INSTRUCTION: &str = "Research is complete. Write the final report in \
Markdown: a title, an executive summary, the key findings with the supporting videos \
(title and id) for each, points of disagreement between sources, and a short conclusion. \
Use only the evidence gathered above.";
