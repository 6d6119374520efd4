//! The agent loop: drives one task from prompt to `done`.
//!
//! Each round streams a completion with the current history and tool
//! schemas, forwards text and reasoning as events, reassembles tool calls,
//! and dispatches them sequentially or as a parallel batch. The final
//! allowed round withholds the tool schemas and tells the model to answer,
//! so every task ends within its round ceiling.
//!
//! Failures inside a tool call become an error string in that call's result
//! message. Only a failure of the top-level completion stream ends the task,
//! and it is always followed by `done`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};
use vidscout_core::error::ProviderError;
use vidscout_core::message::{Conversation, Message, MessageToolCall};
use vidscout_core::provider::{Provider, ProviderRequest, ToolDefinition};
use vidscout_core::report::ReportStore;
use vidscout_core::tool::{ToolCall, ToolProgress, ToolRegistry};
use vidscout_tools::FINISH_TOOL;

use crate::accumulator::StreamAccumulator;
use crate::batch::{BatchExecutor, CallOutcome, execute_call};
use crate::stream_event::{AgentEvent, ConsumerGone, EventEmitter};
use crate::task::{CONTINUE_NUDGE, FORCED_ANSWER_NUDGE, REPORT_INSTRUCTION, TaskKind, TaskRequest};

pub const DEFAULT_INTERACTIVE_ROUNDS: u32 = 15;
pub const DEFAULT_RESEARCH_ROUNDS: u32 = 100;
pub const DEFAULT_BATCH_WORKERS: usize = 5;

const EVENT_BUFFER: usize = 256;

/// Why a run stopped before reaching `done` on its own.
#[derive(Debug)]
enum Interrupt {
    ConsumerGone,
    Completion(ProviderError),
}

impl From<ConsumerGone> for Interrupt {
    fn from(_: ConsumerGone) -> Self {
        Self::ConsumerGone
    }
}

impl From<ProviderError> for Interrupt {
    fn from(e: ProviderError) -> Self {
        Self::Completion(e)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct RunSummary {
    rounds: u32,
    tool_calls: usize,
}

/// The message shown to the user when the completion stream fails.
pub fn completion_error_message(err: &ProviderError) -> String {
    match err {
        ProviderError::AuthenticationFailed(_) => {
            format!("{err}. Check the API key and API base URL in your configuration.")
        }
        _ => format!("Completion request failed: {err}"),
    }
}

/// `Some(tool)` when every call targets the same tool and there are several.
fn batch_tool(calls: &[ToolCall]) -> Option<&str> {
    let first = calls.first()?;
    (calls.len() > 1 && calls.iter().all(|c| c.name == first.name)).then_some(first.name.as_str())
}

fn tool_start(call: &ToolCall) -> AgentEvent {
    AgentEvent::ToolStart {
        call_id: call.id.clone(),
        tool: call.name.clone(),
        args: serde_json::Value::Object(call.arguments.clone()),
    }
}

fn tool_result(outcome: &CallOutcome) -> AgentEvent {
    AgentEvent::ToolResult {
        call_id: outcome.call_id.clone(),
        tool: outcome.tool.clone(),
        success: outcome.success,
        data: outcome.data.clone(),
    }
}

/// Run `work` while forwarding every progress note it sends as a
/// `tool_progress` event.
async fn with_progress<F, Fut, T>(emitter: &EventEmitter, work: F) -> Result<T, ConsumerGone>
where
    F: FnOnce(mpsc::UnboundedSender<ToolProgress>) -> Fut,
    Fut: Future<Output = T>,
{
    let (sink, mut notes) = mpsc::unbounded_channel::<ToolProgress>();
    let work = work(sink);
    let forward = async {
        let mut gone = false;
        while let Some(note) = notes.recv().await {
            if gone {
                continue;
            }
            let event = AgentEvent::ToolProgress {
                call_id: note.call_id,
                tool: note.tool,
                message: note.message,
                data: note.data,
            };
            gone = emitter.emit(event).await.is_err();
        }
        gone
    };

    let (output, gone) = tokio::join!(work, forward);
    if gone { Err(ConsumerGone) } else { Ok(output) }
}

/// The agent loop for one kind of task.
#[derive(Clone)]
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    tools: Arc<ToolRegistry>,
    kind: TaskKind,
    max_rounds: u32,
    batch_workers: usize,
    report_store: Option<Arc<dyn ReportStore>>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        kind: TaskKind,
    ) -> Self {
        let max_rounds = match kind {
            TaskKind::Interactive => DEFAULT_INTERACTIVE_ROUNDS,
            TaskKind::Research => DEFAULT_RESEARCH_ROUNDS,
        };
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tools,
            kind,
            max_rounds,
            batch_workers: DEFAULT_BATCH_WORKERS,
            report_store: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Round ceiling, including the final forced-answer round.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_batch_workers(mut self, workers: usize) -> Self {
        self.batch_workers = workers.max(1);
        self
    }

    pub fn with_report_store(mut self, store: Arc<dyn ReportStore>) -> Self {
        self.report_store = Some(store);
        self
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Start a task in the background and return its event stream.
    ///
    /// Dropping the stream stops the task at its next event.
    pub fn run(&self, task: impl Into<String>, context: Option<serde_json::Value>) -> ReceiverStream<AgentEvent> {
        let request = TaskRequest {
            task: task.into(),
            kind: self.kind,
            context,
        };
        let (emitter, events) = EventEmitter::channel(EVENT_BUFFER);
        let agent = self.clone();
        tokio::spawn(async move { agent.drive(request, emitter).await });
        events
    }

    /// Run a task to completion, reporting through `emitter`.
    pub async fn drive(&self, request: TaskRequest, emitter: EventEmitter) {
        let started = Instant::now();
        match self.execute(&request, &emitter).await {
            Ok(summary) => {
                info!(
                    kind = %self.kind,
                    rounds = summary.rounds,
                    tool_calls = summary.tool_calls,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Task finished"
                );
                let _ = emitter.emit(AgentEvent::Done).await;
            }
            Err(Interrupt::Completion(e)) => {
                warn!(kind = %self.kind, error = %e, "Completion stream failed, ending task");
                let message = completion_error_message(&e);
                if emitter.emit(AgentEvent::Error { message }).await.is_ok() {
                    let _ = emitter.emit(AgentEvent::Done).await;
                }
            }
            Err(Interrupt::ConsumerGone) => {
                info!(kind = %self.kind, "Event consumer went away, task stopped");
            }
        }
    }

    async fn execute(&self, request: &TaskRequest, emitter: &EventEmitter) -> Result<RunSummary, Interrupt> {
        let mut conversation = Conversation::new();
        conversation.push(Message::system(self.kind.system_prompt()));
        conversation.push(Message::user(request.user_message()));
        let mut summary = RunSummary::default();

        for round in 1..=self.max_rounds {
            summary.rounds = round;
            emitter.emit(AgentEvent::RoundStart { round }).await?;
            debug!(conversation_id = %conversation.id, round, messages = conversation.len(), "Round start");

            let last_round = round == self.max_rounds;
            if last_round {
                conversation.push(Message::user(FORCED_ANSWER_NUDGE));
            }
            let schemas = if last_round { Vec::new() } else { self.tools.schemas() };

            let (text, mut calls) = self.stream_completion(&conversation, schemas, round, emitter).await?;
            if last_round && !calls.is_empty() {
                warn!(round, count = calls.len(), "Ignoring tool calls on the final round");
                calls.clear();
            }

            if calls.is_empty() {
                conversation.push(Message::assistant(text));
                if self.kind.runs_until_finished() && !last_round {
                    debug!(round, "No tool calls before finish, nudging");
                    conversation.push(Message::user(CONTINUE_NUDGE));
                    continue;
                }
                return Ok(summary);
            }

            conversation.push(Message::assistant_with_tools(text, calls.clone()));
            let parsed: Vec<ToolCall> = calls.iter().map(ToolCall::from).collect();
            summary.tool_calls += parsed.len();

            let outcomes = match batch_tool(&parsed) {
                Some(tool) => {
                    let tool = tool.to_string();
                    self.execute_batch(tool, parsed, emitter).await?
                }
                None => self.execute_sequential(parsed, emitter).await?,
            };

            let finished = outcomes.iter().any(|o| o.tool == FINISH_TOOL && o.success);
            for outcome in outcomes {
                conversation.push(Message::tool_result(outcome.call_id, outcome.tool, outcome.output));
            }

            if finished {
                self.finalize(&mut conversation, request, round, emitter).await?;
                return Ok(summary);
            }
        }

        Ok(summary)
    }

    /// Stream one completion, forwarding text and reasoning as they arrive.
    async fn stream_completion(
        &self,
        conversation: &Conversation,
        tools: Vec<ToolDefinition>,
        round: u32,
        emitter: &EventEmitter,
    ) -> Result<(String, Vec<MessageToolCall>), Interrupt> {
        let mut request = ProviderRequest::new(&self.model, conversation.messages.clone());
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request.tools = tools;
        request.stream = true;

        let mut chunks = self.provider.stream(request).await?;
        let mut acc = StreamAccumulator::new();

        while let Some(chunk) = chunks.recv().await {
            let chunk = chunk?;
            if let Some(text) = chunk.reasoning.filter(|t| !t.is_empty()) {
                emitter.emit(AgentEvent::Thinking { text }).await?;
            }
            if let Some(text) = chunk.content.filter(|t| !t.is_empty()) {
                acc.push_text(&text);
                emitter.emit(AgentEvent::Content { text }).await?;
            }
            for delta in &chunk.tool_calls {
                acc.apply(delta);
            }
            if chunk.done {
                if let Some(usage) = chunk.usage {
                    debug!(
                        round,
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "Completion usage"
                    );
                }
                break;
            }
        }

        Ok(acc.finish(round))
    }

    async fn execute_sequential(
        &self,
        calls: Vec<ToolCall>,
        emitter: &EventEmitter,
    ) -> Result<Vec<CallOutcome>, Interrupt> {
        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            debug!(tool = %call.name, call_id = %call.id, "Executing tool");
            emitter.emit(tool_start(&call)).await?;
            let registry = &self.tools;
            let outcome = with_progress(emitter, |sink| execute_call(registry, &call, Some(sink))).await?;
            emitter.emit(tool_result(&outcome)).await?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn execute_batch(
        &self,
        tool: String,
        calls: Vec<ToolCall>,
        emitter: &EventEmitter,
    ) -> Result<Vec<CallOutcome>, Interrupt> {
        let executor = BatchExecutor::new(self.tools.clone(), self.batch_workers);
        info!(
            tool = %tool,
            count = calls.len(),
            workers = executor.workers_for(calls.len()),
            "Executing tool batch"
        );

        emitter
            .emit(AgentEvent::BatchStart {
                tool,
                count: calls.len(),
            })
            .await?;
        for call in &calls {
            emitter.emit(tool_start(call)).await?;
        }

        let report = with_progress(emitter, |sink| executor.run(calls, Some(sink))).await?;

        for outcome in &report.outcomes {
            emitter.emit(tool_result(outcome)).await?;
        }
        emitter
            .emit(AgentEvent::BatchComplete {
                total: report.total,
                success: report.success,
                tokens: report.tokens,
            })
            .await?;

        Ok(report.outcomes)
    }

    /// Stream the final report without tools, then persist it.
    async fn finalize(
        &self,
        conversation: &mut Conversation,
        request: &TaskRequest,
        round: u32,
        emitter: &EventEmitter,
    ) -> Result<(), Interrupt> {
        emitter.emit(AgentEvent::ReportStart).await?;
        info!(round, "Writing final report");

        conversation.push(Message::user(REPORT_INSTRUCTION));
        let (report, stray) = self
            .stream_completion(conversation, Vec::new(), round + 1, emitter)
            .await?;
        if !stray.is_empty() {
            warn!(count = stray.len(), "Ignoring tool calls in the final report");
        }
        conversation.push(Message::assistant(report.clone()));

        let Some(store) = &self.report_store else {
            return Ok(());
        };
        if report.trim().is_empty() {
            warn!("Final report is empty, not saving");
            return Ok(());
        }
        match store.save(&request.task, &report).await {
            Ok(path) => info!(path = %path.display(), "Report saved"),
            Err(e) => warn!(error = %e, "Failed to save report"),
        }
        Ok(())
    }
}
