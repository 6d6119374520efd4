//! In-memory collaborators for tool tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use vidscout_core::error::{ProviderError, ServiceError};
use vidscout_core::message::Message;
use vidscout_core::provider::{Provider, ProviderRequest, ProviderResponse};
use vidscout_core::search::{SearchBackend, SearchHit};
use vidscout_core::video::*;

#[derive(Default)]
pub struct FakeVideoPlatform {
    pub subtitle_lines: usize,
    pub fail_comments: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeVideoPlatform {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoPlatform for FakeVideoPlatform {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(
        &self,
        keyword: &str,
        limit: usize,
        order: Option<&str>,
    ) -> Result<Vec<VideoSummary>, ServiceError> {
        self.record(format!("search:{keyword}:{limit}:{}", order.unwrap_or("-")));
        Ok((0..limit.min(3))
            .map(|i| VideoSummary {
                id: format!("v{i}"),
                title: format!("{keyword} #{i}"),
                views: 100 * (i as u64 + 1),
                ..VideoSummary::default()
            })
            .collect())
    }

    async fn video(&self, video_id: &str) -> Result<VideoDetail, ServiceError> {
        self.record(format!("video:{video_id}"));
        if video_id == "missing" {
            return Err(ServiceError::NotFound(video_id.to_string()));
        }
        Ok(VideoDetail {
            summary: VideoSummary {
                id: video_id.to_string(),
                title: "A video".into(),
                ..VideoSummary::default()
            },
            description: "desc".into(),
            ..VideoDetail::default()
        })
    }

    async fn subtitles(&self, video_id: &str) -> Result<Vec<SubtitleLine>, ServiceError> {
        self.record(format!("subtitles:{video_id}"));
        Ok((0..self.subtitle_lines)
            .map(|i| SubtitleLine {
                from: i as f64,
                to: i as f64 + 1.0,
                text: format!("line {i} of the transcript"),
            })
            .collect())
    }

    async fn comments(&self, video_id: &str, limit: usize) -> Result<Vec<Comment>, ServiceError> {
        self.record(format!("comments:{video_id}:{limit}"));
        if self.fail_comments {
            return Err(ServiceError::Http {
                service: "fake".into(),
                status: 400,
                message: "comments disabled".into(),
            });
        }
        Ok(vec![Comment {
            author: "viewer".into(),
            text: "great".into(),
            likes: 5,
        }])
    }

    async fn frames(&self, video_id: &str, count: usize) -> Result<Vec<Frame>, ServiceError> {
        self.record(format!("frames:{video_id}:{count}"));
        Ok((0..count)
            .map(|i| Frame {
                timestamp_secs: i as f64 * 10.0,
                url: format!("https://frames.example/{video_id}/{i}.jpg"),
            })
            .collect())
    }

    async fn user(&self, id_or_name: &str) -> Result<UserProfile, ServiceError> {
        self.record(format!("user:{id_or_name}"));
        if id_or_name == "nobody" {
            return Err(ServiceError::NotFound(id_or_name.to_string()));
        }
        Ok(UserProfile {
            id: "u1".into(),
            name: id_or_name.to_string(),
            followers: 42,
            ..UserProfile::default()
        })
    }
}

/// Counts calls; fails with 503 for the first `failures` calls.
#[derive(Default)]
pub struct FakeSearch {
    pub failures: usize,
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchBackend for FakeSearch {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ServiceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(ServiceError::Http {
                service: "fake".into(),
                status: 503,
                message: "busy".into(),
            });
        }
        Ok((0..max_results)
            .map(|i| SearchHit {
                title: format!("{query} result {i}"),
                url: format!("https://example.com/{i}"),
                published_date: None,
            })
            .collect())
    }
}

/// Answers every completion with a fixed summary.
pub struct FakeSummarizer {
    pub calls: AtomicUsize,
}

impl FakeSummarizer {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Provider for FakeSummarizer {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderResponse {
            message: Message::assistant("condensed transcript"),
            usage: None,
            model: "fake".into(),
        })
    }
}
