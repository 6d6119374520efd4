//! In-depth analysis of a single video.
//!
//! Gathers metadata, the subtitle transcript, top comments and (optionally)
//! still-frame references. Transcripts longer than [`TRANSCRIPT_CHAR_LIMIT`]
//! are condensed by a one-shot completion; if that fails, or no completion
//! backend is configured, the transcript is truncated instead.
//!
//! Only the metadata fetch is fatal. Missing subtitles, comments or frames
//! degrade the result but never fail the call.

use async_trait::async_trait;
use tracing::warn;
use vidscout_core::error::ToolError;
use vidscout_core::limits::Dependency;
use vidscout_core::message::Message;
use vidscout_core::provider::ProviderRequest;
use vidscout_core::tool::{ServiceSlot, Tool, ToolContext, ToolResult, ToolServices};
use vidscout_core::video::SubtitleLine;

pub const NAME: &str = "analyze_video";

/// Transcripts above this many characters are condensed.
pub const TRANSCRIPT_CHAR_LIMIT: usize = 6000;

const CONDENSE_PROMPT: &str = "You condense video transcripts for a researcher. \
Keep every concrete claim, number, name and recommendation. Drop filler, greetings \
and sponsor segments. Answer in the transcript's language, as plain prose.";

#[derive(Default)]
pub struct AnalyzeVideoTool {
    services: ServiceSlot,
}

impl AnalyzeVideoTool {
    pub fn new() -> Self {
        Self::default()
    }
}

fn join_transcript(lines: &[SubtitleLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

/// Condense `transcript` with the completion backend, if there is one.
async fn condense(services: &ToolServices, transcript: &str) -> Option<String> {
    let provider = services.completion.as_ref()?;
    let mut request = ProviderRequest::new(
        services.completion_model.clone(),
        vec![Message::system(CONDENSE_PROMPT), Message::user(transcript)],
    );
    request.temperature = 0.2;

    match provider.complete(request).await {
        Ok(response) if !response.message.content.trim().is_empty() => Some(response.message.content),
        Ok(_) => None,
        Err(e) => {
            warn!(tool = NAME, error = %e, "Transcript condensation failed, truncating instead");
            None
        }
    }
}

#[async_trait]
impl Tool for AnalyzeVideoTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Analyze one video in depth: metadata, full transcript (condensed when long), \
         top comments and optionally still frames. Use after search_videos to study \
         the most relevant results."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "video_id": {
                    "type": "string",
                    "description": "Video id as returned by search_videos"
                },
                "include_comments": {
                    "type": "boolean",
                    "description": "Fetch top comments (default true)"
                },
                "include_frames": {
                    "type": "boolean",
                    "description": "Extract still-frame references (default false, slower)"
                }
            },
            "required": ["video_id"]
        })
    }

    fn set_services(&self, services: &ToolServices) {
        self.services.set(services);
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let video_id = arguments["video_id"]
            .as_str()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("'video_id' must be a non-empty string".into()))?;
        let include_comments = arguments["include_comments"].as_bool().unwrap_or(true);
        let include_frames = arguments["include_frames"].as_bool().unwrap_or(false);

        let services = self.services.get(NAME)?;
        let video = services.video_for(NAME)?;
        let settings = &services.settings;
        let caller = &services.caller;

        ctx.report(format!("Fetching metadata for {video_id}"));
        let detail = caller
            .retry(Some(settings.metadata_timeout), || video.video(video_id))
            .await
            .map_err(|e| ToolError::from_service(NAME, e))?;

        ctx.report("Fetching subtitles");
        let lines = match caller
            .retry(Some(settings.metadata_timeout), || video.subtitles(video_id))
            .await
        {
            Ok(lines) => lines,
            Err(e) => {
                warn!(tool = NAME, video_id, error = %e, "Subtitles unavailable");
                Vec::new()
            }
        };

        let full = join_transcript(&lines);
        let original_chars = full.chars().count();
        let (transcript, condensed) = if original_chars > TRANSCRIPT_CHAR_LIMIT {
            ctx.report_with(
                "Condensing long transcript",
                Some(serde_json::json!({ "chars": original_chars })),
            );
            match condense(&services, &full).await {
                Some(summary) => (summary, true),
                None => (truncate_chars(&full, TRANSCRIPT_CHAR_LIMIT), false),
            }
        } else {
            (full, false)
        };

        let comments = if include_comments {
            ctx.report("Fetching top comments");
            match caller
                .retry(Some(settings.metadata_timeout), || {
                    video.comments(video_id, settings.comment_limit)
                })
                .await
            {
                Ok(comments) => comments,
                Err(e) => {
                    warn!(tool = NAME, video_id, error = %e, "Comments unavailable");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let frames = if include_frames {
            ctx.report("Extracting frames");
            match caller
                .call(Dependency::FrameExtraction, Some(settings.metadata_timeout), || {
                    video.frames(video_id, settings.frame_count)
                })
                .await
            {
                Ok(frames) => frames,
                Err(e) => {
                    warn!(tool = NAME, video_id, error = %e, "Frame extraction failed");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(ToolResult::json(
            ctx,
            serde_json::json!({
                "video": detail,
                "transcript": transcript,
                "transcript_condensed": condensed,
                "transcript_chars": original_chars,
                "comments": comments,
                "frames": frames,
            }),
        ))
    }
}
