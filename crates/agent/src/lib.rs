//! The vidscout agent: a round-based conversation loop over a streaming
//! completion backend.
//!
//! 1. **Seed** the history with task instructions and the user's task
//! 2. **Stream** a completion, forwarding text and reasoning as events
//! 3. **Dispatch** the requested tool calls, in parallel when every call
//!    targets the same tool
//! 4. **Repeat** until the model answers without tools, the round ceiling
//!    forces an answer, or the termination tool triggers the final report
//!
//! Every run produces one ordered [`AgentEvent`] stream that always ends
//! with `done`.

pub mod accumulator;
pub mod batch;
pub mod loop_runner;
pub mod runtime;
pub mod stream_event;
pub mod task;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use accumulator::StreamAccumulator;
pub use batch::{BatchExecutor, BatchReport, CallOutcome, parallel_map_ordered};
pub use loop_runner::AgentLoop;
pub use runtime::{LoopSettings, Runtime};
pub use stream_event::{AgentEvent, ConsumerGone, EventEmitter};
pub use task::{TaskKind, TaskRequest};
