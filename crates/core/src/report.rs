//! Report persistence collaborator contract.
//!
//! Saving is best-effort: the agent logs a failure and still finishes the
//! task.

use async_trait::async_trait;
use std::path::PathBuf;
use crate::error::StorageError;

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a finished report and return where it was written.
    async fn save(&self, topic: &str, content: &str) -> Result<PathBuf, StorageError>;
}
