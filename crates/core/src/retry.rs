//! Uniform admission and retry policy for outbound calls.
//!
//! Business code hands a closure to [`RetryingCaller`]; the caller takes a
//! slot on the dependency's semaphore, applies a per-attempt timeout, and
//! retries transient failures with jittered exponential backoff. Terminal
//! errors and exhausted retries come back to the caller unchanged.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Retryable;
use crate::limits::{ConcurrencyLimits, Dependency, Permit};

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// Delay before the first retry, before jitter
    pub base_delay: Duration,
    /// Upper bound on any single delay, before jitter
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Un-jittered delay before retry number `attempt` (0-based):
    /// `min(max_delay, base_delay * 2^attempt)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff scaled by a random factor in [0.75, 1.25].
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.75..=1.25);
        self.backoff(attempt).mul_f64(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Runs outbound calls under admission control and retry.
#[derive(Debug, Clone)]
pub struct RetryingCaller {
    limits: ConcurrencyLimits,
    policy: RetryPolicy,
}

impl RetryingCaller {
    pub fn new(limits: ConcurrencyLimits, policy: RetryPolicy) -> Self {
        Self { limits, policy }
    }

    pub fn limits(&self) -> &ConcurrencyLimits {
        &self.limits
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `op` holding a `dependency` slot for the duration of each attempt.
    ///
    /// The slot is released before sleeping between attempts so a backing-off
    /// call does not starve others.
    pub async fn call<T, E, F, Fut>(
        &self,
        dependency: Dependency,
        timeout: Option<Duration>,
        op: F,
    ) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (value, _permit) = self.run(Some(dependency), timeout, op).await?;
        Ok(value)
    }

    /// Like [`call`](Self::call), but the successful attempt's slot is handed
    /// back so the caller can keep it past the return (an open stream).
    pub async fn call_admitted<T, E, F, Fut>(
        &self,
        dependency: Dependency,
        timeout: Option<Duration>,
        op: F,
    ) -> Result<(T, Permit), E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(Some(dependency), timeout, op).await
    }

    /// Same retry and timeout policy, without admission control.
    pub async fn retry<T, E, F, Fut>(&self, timeout: Option<Duration>, op: F) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (value, _) = self.run(None, timeout, op).await?;
        Ok(value)
    }

    async fn run<T, E, F, Fut>(
        &self,
        dependency: Option<Dependency>,
        timeout: Option<Duration>,
        mut op: F,
    ) -> Result<(T, Permit), E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let label = dependency.map_or("unlimited", |d| d.as_str());
        let mut attempt = 0u32;
        loop {
            let permit = match dependency {
                Some(dep) => self.limits.acquire(dep).await,
                None => Permit::unlimited(),
            };
            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(result) => result,
                    Err(_) => Err(E::timed_out(limit)),
                },
                None => op().await,
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(dependency = label, attempt, "Call succeeded after retry");
                    }
                    return Ok((value, permit));
                }
                Err(err) => err,
            };
            drop(permit);

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= self.policy.max_retries {
                warn!(
                    dependency = label,
                    attempts = attempt + 1,
                    error = %err,
                    "Retries exhausted"
                );
                return Err(err);
            }

            let delay = self.policy.jittered_backoff(attempt);
            warn!(
                dependency = label,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Transient failure, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryingCaller {
    fn default() -> Self {
        Self::new(ConcurrencyLimits::default(), RetryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProviderError, ServiceError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn http(status: u16) -> ServiceError {
        ServiceError::Http {
            service: "fake".into(),
            status,
            message: "boom".into(),
        }
    }

    /// Fails with the scripted errors in order, then succeeds.
    fn scripted(
        failures: Vec<ServiceError>,
        calls: Arc<AtomicU32>,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<&'static str, ServiceError>> + Send>>
    {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) as usize;
            let next = failures.get(n).cloned();
            Box::pin(async move {
                match next {
                    Some(err) => Err(err),
                    None => Ok("ok"),
                }
            })
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(500));
        assert_eq!(policy.backoff(40), Duration::from_millis(500));
    }

    #[test]
    fn jitter_stays_in_band() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000), Duration::from_secs(10));
        for _ in 0..200 {
            let d = policy.jittered_backoff(0);
            assert!(d >= Duration::from_millis(750) && d <= Duration::from_millis(1250), "{d:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_503_twice_then_succeeds() {
        let caller = RetryingCaller::default();
        let calls = Arc::new(AtomicU32::new(0));

        let result = caller
            .call(
                Dependency::WebSearch,
                None,
                scripted(vec![http(503), http(503)], calls.clone()),
            )
            .await;

        assert_eq!(result.unwrap(), "ok");
        // 1 initial attempt + exactly 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_is_not_retried() {
        let caller = RetryingCaller::default();
        let calls = Arc::new(AtomicU32::new(0));

        let result = caller
            .call(Dependency::WebSearch, None, scripted(vec![http(400)], calls.clone()))
            .await;

        assert!(matches!(result, Err(ServiceError::Http { status: 400, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_error() {
        let caller = RetryingCaller::new(
            ConcurrencyLimits::default(),
            RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(50)),
        );
        let calls = Arc::new(AtomicU32::new(0));

        let result = caller
            .retry(None, scripted(vec![http(502), http(502), http(504), http(500)], calls.clone()))
            .await;

        assert!(matches!(result, Err(ServiceError::Http { status: 504, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_retryable() {
        let caller = RetryingCaller::new(
            ConcurrencyLimits::default(),
            RetryPolicy::new(1, Duration::from_millis(10), Duration::from_millis(10)),
        );
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), ProviderError> = caller
            .call(Dependency::Completion, Some(Duration::from_secs(1)), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(ProviderError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn admitted_call_keeps_its_slot() {
        let limits = ConcurrencyLimits::new(1, 1, 1);
        let caller = RetryingCaller::new(
            limits.clone(),
            RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(10)),
        );
        let calls = Arc::new(AtomicU32::new(0));

        let (value, permit) = caller
            .call_admitted(Dependency::Completion, None, scripted(vec![http(503)], calls.clone()))
            .await
            .unwrap();
        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(limits.available(Dependency::Completion), 0);

        drop(permit);
        assert_eq!(limits.available(Dependency::Completion), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn permit_is_released_after_call() {
        let limits = ConcurrencyLimits::new(1, 1, 1);
        let caller = RetryingCaller::new(limits.clone(), RetryPolicy::default());
        let calls = Arc::new(AtomicU32::new(0));

        let _ = caller
            .call(Dependency::Completion, None, scripted(vec![http(503)], calls))
            .await;
        assert_eq!(limits.available(Dependency::Completion), 1);
    }
}
