//! Parallel execution of same-tool calls.
//!
//! [`parallel_map_ordered`] is the one place the loop crosses into
//! concurrent execution: it fans items out to a bounded set of tokio tasks
//! and hands back results in input order, whatever order they finish in.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, warn};
use vidscout_core::message::estimate_tokens;
use vidscout_core::tool::{ToolCall, ToolContext, ToolProgress, ToolRegistry};

/// Map `f` over `items` with at most `workers` running at once.
///
/// Output position `i` always holds the result for input `i`. A worker that
/// panics yields `Err` for its own slot only.
pub async fn parallel_map_ordered<T, R, F, Fut>(items: Vec<T>, workers: usize, f: F) -> Vec<Result<R, String>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let f = Arc::new(f);

    let handles: Vec<_> = items
        .into_iter()
        .map(|item| {
            let semaphore = semaphore.clone();
            let f = f.clone();
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                f(item).await
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.map_err(|e| format!("worker failed: {e}")));
    }
    results
}

/// What one tool call produced, ready for history and for the event stream.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub call_id: String,
    pub tool: String,
    pub success: bool,
    /// Text appended to history as the tool-role message
    pub output: String,
    /// Payload forwarded to the client in `tool_result`
    pub data: serde_json::Value,
}

impl CallOutcome {
    fn failed(call: &ToolCall, reason: String) -> Self {
        Self {
            call_id: call.id.clone(),
            tool: call.name.clone(),
            success: false,
            output: format!("Error: {reason}"),
            data: serde_json::json!({ "error": reason }),
        }
    }
}

/// The single-call pipeline: validate, execute, and fold any failure into
/// an error outcome. Never fails.
pub async fn execute_call(
    registry: &ToolRegistry,
    call: &ToolCall,
    progress: Option<mpsc::UnboundedSender<ToolProgress>>,
) -> CallOutcome {
    let mut ctx = ToolContext::new(&call.id, &call.name);
    if let Some(sink) = progress {
        ctx = ctx.with_progress(sink);
    }

    match registry.execute(&call.name, call.arguments.clone(), &ctx).await {
        Ok(result) => {
            let data = result
                .data
                .unwrap_or_else(|| serde_json::Value::String(result.output.clone()));
            CallOutcome {
                call_id: call.id.clone(),
                tool: call.name.clone(),
                success: result.success,
                output: result.output,
                data,
            }
        }
        Err(e) => {
            warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool call failed");
            CallOutcome::failed(call, e.to_string())
        }
    }
}

/// Aggregate of one parallel batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One outcome per call, in original call order
    pub outcomes: Vec<CallOutcome>,
    pub total: usize,
    pub success: usize,
    pub tokens: usize,
}

/// Runs N same-tool calls on a bounded worker pool.
#[derive(Clone)]
pub struct BatchExecutor {
    registry: Arc<ToolRegistry>,
    max_workers: usize,
}

impl BatchExecutor {
    pub fn new(registry: Arc<ToolRegistry>, max_workers: usize) -> Self {
        Self {
            registry,
            max_workers: max_workers.max(1),
        }
    }

    /// Worker count for a batch of `calls` calls.
    pub fn workers_for(&self, calls: usize) -> usize {
        calls.min(self.max_workers).max(1)
    }

    pub async fn run(
        &self,
        calls: Vec<ToolCall>,
        progress: Option<mpsc::UnboundedSender<ToolProgress>>,
    ) -> BatchReport {
        let workers = self.workers_for(calls.len());
        debug!(calls = calls.len(), workers, "Running tool batch");

        let registry = self.registry.clone();
        let originals = calls.clone();
        let results = parallel_map_ordered(calls, workers, move |call: ToolCall| {
            let registry = registry.clone();
            let progress = progress.clone();
            async move { execute_call(&registry, &call, progress).await }
        })
        .await;

        let outcomes: Vec<CallOutcome> = results
            .into_iter()
            .zip(originals.iter())
            .map(|(result, call)| result.unwrap_or_else(|reason| CallOutcome::failed(call, reason)))
            .collect();

        let success = outcomes.iter().filter(|o| o.success).count();
        let tokens = outcomes.iter().map(|o| estimate_tokens(&o.output)).sum();
        BatchReport {
            total: outcomes.len(),
            success,
            tokens,
            outcomes,
        }
    }
}
