//! HTTP gateway for vidscout.
//!
//! Exposes the agent's single operation, `run(task, context)`, as a
//! server-sent-events stream, plus health and tool-listing endpoints.
//!
//! Built on Axum.

pub mod sse;

use axum::extract::{DefaultBodyLimit, Query};
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use vidscout_agent::{Runtime, TaskKind, TaskRequest};
use vidscout_config::AppConfig;
use vidscout_core::provider::ToolDefinition;

type SharedState = Arc<Runtime>;

/// Request bodies above this size are rejected.
const BODY_LIMIT: usize = 1024 * 1024;

/// Build the router with every gateway route.
///
/// Layers applied:
/// - CORS restricted to the local web UI origin
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(runtime: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(HeaderValue::from_static("http://localhost:8080")))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/tools", get(list_tools_handler))
        .route("/v1/tasks/stream", post(task_stream_handler))
        .with_state(runtime)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// `port` overrides `[gateway] port` when given.
pub async fn start(config: AppConfig, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = port.unwrap_or(config.gateway.port);
    let addr = format!("{host}:{port}");

    let runtime = Arc::new(Runtime::from_config(&config)?);
    let app = build_router(runtime);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    provider: String,
}

async fn health_handler(State(runtime): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        provider: runtime.provider_name().to_string(),
    })
}

#[derive(Deserialize)]
struct ToolsQuery {
    kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub kind: TaskKind,
    pub count: usize,
    pub tools: Vec<ToolDefinition>,
}

/// `GET /v1/tools?kind=`: tool schemas offered to the model for a task kind.
async fn list_tools_handler(
    State(runtime): State<SharedState>,
    Query(query): Query<ToolsQuery>,
) -> Result<Json<ToolListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let kind = match query.kind.as_deref() {
        None => TaskKind::default(),
        Some(raw) => raw.parse::<TaskKind>().map_err(bad_request)?,
    };
    let tools = runtime.tools(kind).schemas();

    Ok(Json(ToolListResponse {
        kind,
        count: tools.len(),
        tools,
    }))
}

/// `POST /v1/tasks/stream`: run a task, receive its events as SSE.
async fn task_stream_handler(
    State(runtime): State<SharedState>,
    Json(request): Json<TaskRequest>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if request.task.trim().is_empty() {
        warn!("Rejected task stream request with an empty task");
        return Err(bad_request("task must not be empty"));
    }
    info!(kind = %request.kind, task_len = request.task.len(), "Task stream request");

    let events = runtime.run(request);
    let body = Body::from_stream(sse::body_stream(events));

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}
