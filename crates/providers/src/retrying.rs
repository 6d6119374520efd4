//! Admission control and retry around a completion backend.
//!
//! Every round of every task goes through the same completion semaphore.
//! A streamed completion keeps its slot until the stream is fully drained,
//! dropped, or goes quiet for longer than the idle timeout. Opening the
//! stream is retried on transient failure, as is a transient error that
//! arrives before the first chunk. Once any chunk has been handed to the
//! consumer, a later error is passed through as-is.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;
use vidscout_core::error::{ProviderError, Retryable};
use vidscout_core::limits::Dependency;
use vidscout_core::provider::*;
use vidscout_core::retry::RetryingCaller;

/// Silence allowed between chunks unless configured otherwise.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// A provider wrapper that applies the shared completion limit and retry policy.
pub struct RetryingProvider {
    inner: Arc<dyn Provider>,
    caller: RetryingCaller,
    open_timeout: Duration,
    idle_timeout: Duration,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn Provider>, caller: RetryingCaller, open_timeout: Duration) -> Self {
        Self {
            inner,
            caller,
            open_timeout,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

#[async_trait]
impl Provider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let inner = &self.inner;
        self.caller
            .call(Dependency::Completion, Some(self.open_timeout), move || {
                let request = request.clone();
                async move { inner.complete(request).await }
            })
            .await
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let inner = &self.inner;
        // An attempt succeeds once the stream is open and its first item is
        // not an error.
        let ((mut upstream, first), permit) = self
            .caller
            .call_admitted(Dependency::Completion, Some(self.open_timeout), || {
                let request = request.clone();
                async move {
                    let mut rx = inner.stream(request).await?;
                    match rx.recv().await {
                        Some(Err(e)) => Err(e),
                        first => Ok((rx, first)),
                    }
                }
            })
            .await?;

        let idle_timeout = self.idle_timeout;
        let provider = self.inner.name().to_string();
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            let _permit = permit;
            if let Some(first) = first {
                if tx.send(first).await.is_err() {
                    return;
                }
            }
            loop {
                match tokio::time::timeout(idle_timeout, upstream.recv()).await {
                    Ok(Some(item)) => {
                        if tx.send(item).await.is_err() {
                            return; // consumer went away
                        }
                    }
                    Ok(None) => return,
                    Err(_) => {
                        warn!(
                            provider = %provider,
                            idle_secs = idle_timeout.as_secs(),
                            "Completion stream stalled, closing it"
                        );
                        let _ = tx.send(Err(ProviderError::timed_out(idle_timeout))).await;
                        return;
                    }
                }
            }
        });
        Ok(rx)
    }
}
