//! Markdown report persistence on the local filesystem.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use vidscout_core::error::StorageError;
use vidscout_core::report::ReportStore;

const MAX_SLUG_CHARS: usize = 60;

/// Writes each report to `<dir>/<slug>-<timestamp>.md`.
pub struct FileReportStore {
    dir: PathBuf,
}

impl FileReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Lowercase alphanumerics, everything else collapsed to single dashes.
pub fn slugify(topic: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in topic.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.chars().count() >= MAX_SLUG_CHARS {
            break;
        }
    }
    slug
}

#[async_trait]
impl ReportStore for FileReportStore {
    async fn save(&self, topic: &str, content: &str) -> Result<PathBuf, StorageError> {
        let mut slug = slugify(topic);
        if topic.trim().is_empty() {
            return Err(StorageError::InvalidTopic("topic is empty".into()));
        }
        if slug.is_empty() {
            slug.push_str("report");
        }

        let io_err = |path: &Path, e: std::io::Error| StorageError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_err(&self.dir, e))?;

        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let path = self.dir.join(format!("{slug}-{stamp}.md"));
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| io_err(&path, e))?;

        debug!(path = %path.display(), bytes = content.len(), "Report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert_eq!(slugify("Rust async runtimes: 2024!"), "rust-async-runtimes-2024");
        assert_eq!(slugify("  --Hello   World--  "), "hello-world");
        assert_eq!(slugify("视频 分析"), "视频-分析");
        assert_eq!(slugify("???"), "");
        assert!(slugify(&"x".repeat(200)).chars().count() <= MAX_SLUG_CHARS);
    }

    #[tokio::test]
    async fn save_writes_markdown_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path().join("reports"));

        let path = store.save("Creator economy trends", "# Report\n\nBody").await.unwrap();
        assert!(path.starts_with(dir.path().join("reports")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("creator-economy-trends-"));
        assert!(name.ends_with(".md"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n\nBody");
    }

    #[tokio::test]
    async fn punctuation_only_topic_falls_back_to_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path());
        let path = store.save("???", "x").await.unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("report-"));
    }

    #[tokio::test]
    async fn empty_topic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReportStore::new(dir.path());
        let err = store.save("   ", "x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidTopic(_)));
    }

    #[tokio::test]
    async fn unwritable_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let store = FileReportStore::new(blocker.join("sub"));
        let err = store.save("topic", "x").await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
