//! JSON REST client for a video-platform proxy.
//!
//! The proxy is expected to expose:
//!
//! | Method | Path                        | Response                    |
//! |--------|-----------------------------|-----------------------------|
//! | GET    | `/videos/search`            | `{ "videos": [...] }`       |
//! | GET    | `/videos/{id}`              | video detail object         |
//! | GET    | `/videos/{id}/subtitles`    | `{ "lines": [...] }`        |
//! | GET    | `/videos/{id}/comments`     | `{ "comments": [...] }`     |
//! | GET    | `/videos/{id}/frames`       | `{ "frames": [...] }`       |
//! | GET    | `/users/lookup?q=`          | user profile object         |

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use vidscout_core::error::ServiceError;
use vidscout_core::video::*;

use crate::http::{build_client, encode_segment, read_json, transport_error};

const SERVICE: &str = "video platform";

pub struct HttpVideoPlatform {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpVideoPlatform {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: build_client(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ServiceError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Video platform request");

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;
        read_json(SERVICE, response).await
    }
}

#[derive(Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    videos: Vec<VideoSummary>,
}

#[derive(Deserialize)]
struct SubtitleEnvelope {
    #[serde(default)]
    lines: Vec<SubtitleLine>,
}

#[derive(Deserialize)]
struct CommentEnvelope {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Deserialize)]
struct FrameEnvelope {
    #[serde(default)]
    frames: Vec<Frame>,
}

#[async_trait]
impl VideoPlatform for HttpVideoPlatform {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(
        &self,
        keyword: &str,
        limit: usize,
        order: Option<&str>,
    ) -> Result<Vec<VideoSummary>, ServiceError> {
        let mut query = vec![("keyword", keyword.to_string()), ("limit", limit.to_string())];
        if let Some(order) = order {
            query.push(("order", order.to_string()));
        }
        let envelope: SearchEnvelope = self.get("/videos/search", &query).await?;
        Ok(envelope.videos)
    }

    async fn video(&self, video_id: &str) -> Result<VideoDetail, ServiceError> {
        self.get(&format!("/videos/{}", encode_segment(video_id)), &[])
            .await
    }

    async fn subtitles(&self, video_id: &str) -> Result<Vec<SubtitleLine>, ServiceError> {
        let envelope: SubtitleEnvelope = self
            .get(&format!("/videos/{}/subtitles", encode_segment(video_id)), &[])
            .await?;
        Ok(envelope.lines)
    }

    async fn comments(&self, video_id: &str, limit: usize) -> Result<Vec<Comment>, ServiceError> {
        let envelope: CommentEnvelope = self
            .get(
                &format!("/videos/{}/comments", encode_segment(video_id)),
                &[("limit", limit.to_string())],
            )
            .await?;
        Ok(envelope.comments)
    }

    async fn frames(&self, video_id: &str, count: usize) -> Result<Vec<Frame>, ServiceError> {
        let envelope: FrameEnvelope = self
            .get(
                &format!("/videos/{}/frames", encode_segment(video_id)),
                &[("count", count.to_string())],
            )
            .await?;
        Ok(envelope.frames)
    }

    async fn user(&self, id_or_name: &str) -> Result<UserProfile, ServiceError> {
        self.get("/users/lookup", &[("q", id_or_name.to_string())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use vidscout_core::error::Retryable;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn proxy() -> Router {
        Router::new()
            .route(
                "/videos/search",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(serde_json::json!({
                        "videos": [{
                            "id": "v1",
                            "title": format!("{} explained", q["keyword"]),
                            "views": 1200,
                        }],
                        "echo_limit": q["limit"],
                    }))
                }),
            )
            .route(
                "/videos/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "missing" {
                        return Err(StatusCode::NOT_FOUND);
                    }
                    Ok(Json(serde_json::json!({
                        "id": id,
                        "title": "Deep dive",
                        "author": "chan",
                        "tags": ["rust"],
                        "likes": 10,
                    })))
                }),
            )
            .route(
                "/videos/{id}/subtitles",
                get(|| async {
                    Json(serde_json::json!({
                        "lines": [{"from": 0.0, "to": 1.5, "text": "hello"}]
                    }))
                }),
            )
            .route(
                "/videos/{id}/comments",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            )
            .route(
                "/users/lookup",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(serde_json::json!({"id": "u1", "name": q["q"], "followers": 3}))
                }),
            )
    }

    #[tokio::test]
    async fn search_passes_query_and_decodes() {
        let base = serve(proxy()).await;
        let platform = HttpVideoPlatform::new(base, None);
        let videos = platform.search("tokio", 5, Some("views")).await.unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].title, "tokio explained");
        assert_eq!(videos[0].views, 1200);
    }

    #[tokio::test]
    async fn video_detail_flattens_summary() {
        let base = serve(proxy()).await;
        let platform = HttpVideoPlatform::new(base, Some("key".into()));
        let detail = platform.video("v42").await.unwrap();
        assert_eq!(detail.summary.id, "v42");
        assert_eq!(detail.summary.author, "chan");
        assert_eq!(detail.tags, vec!["rust".to_string()]);
    }

    #[tokio::test]
    async fn not_found_maps_to_terminal_error() {
        let base = serve(proxy()).await;
        let platform = HttpVideoPlatform::new(base, None);
        let err = platform.video("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn unavailable_maps_to_retryable_error() {
        let base = serve(proxy()).await;
        let platform = HttpVideoPlatform::new(base, None);
        let err = platform.comments("v1", 10).await.unwrap_err();
        assert!(matches!(err, ServiceError::Http { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn subtitles_and_user_lookup() {
        let base = serve(proxy()).await;
        let platform = HttpVideoPlatform::new(base, None);
        let lines = platform.subtitles("v1").await.unwrap();
        assert_eq!(lines[0].text, "hello");
        let user = platform.user("some creator").await.unwrap();
        assert_eq!(user.name, "some creator");
        assert_eq!(user.followers, 3);
    }
}
