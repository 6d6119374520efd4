//! Process-wide admission control for external dependencies.
//!
//! One bounded semaphore per dependency. Every task and every batch worker
//! contends on the same instance, so the ceiling holds system-wide no
//! matter how many tasks are running.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

/// The external dependencies that are admission-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependency {
    /// The LLM completion API
    Completion,
    /// The web-search API
    WebSearch,
    /// The video frame-extraction API
    FrameExtraction,
}

impl Dependency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completion => "completion",
            Self::WebSearch => "web_search",
            Self::FrameExtraction => "frame_extraction",
        }
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A held admission slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct Permit {
    _inner: Option<OwnedSemaphorePermit>,
}

impl Permit {
    /// A permit that holds no slot, for calls outside admission control.
    pub(crate) fn unlimited() -> Self {
        Self { _inner: None }
    }
}

/// The three named semaphores.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimits {
    completion: Arc<Semaphore>,
    web_search: Arc<Semaphore>,
    frame_extraction: Arc<Semaphore>,
}

impl ConcurrencyLimits {
    /// Create limits with the given number of concurrent slots per dependency.
    /// A zero size is raised to one so no dependency is locked out entirely.
    pub fn new(completion: usize, web_search: usize, frame_extraction: usize) -> Self {
        Self {
            completion: Arc::new(Semaphore::new(completion.max(1))),
            web_search: Arc::new(Semaphore::new(web_search.max(1))),
            frame_extraction: Arc::new(Semaphore::new(frame_extraction.max(1))),
        }
    }

    fn semaphore(&self, dependency: Dependency) -> &Arc<Semaphore> {
        match dependency {
            Dependency::Completion => &self.completion,
            Dependency::WebSearch => &self.web_search,
            Dependency::FrameExtraction => &self.frame_extraction,
        }
    }

    /// Wait for a free slot on `dependency`.
    pub async fn acquire(&self, dependency: Dependency) -> Permit {
        match self.semaphore(dependency).clone().acquire_owned().await {
            Ok(permit) => Permit {
                _inner: Some(permit),
            },
            Err(_) => {
                // Semaphores here are never closed; proceed unthrottled if one is.
                warn!(dependency = %dependency, "Admission semaphore closed, proceeding without a permit");
                Permit { _inner: None }
            }
        }
    }

    /// Slots currently free on `dependency`.
    pub fn available(&self, dependency: Dependency) -> usize {
        self.semaphore(dependency).available_permits()
    }
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self::new(4, 3, 2)
    }
}
