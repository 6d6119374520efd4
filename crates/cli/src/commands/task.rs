//! `vidscout ask` / `vidscout research`: run one task and stream its events.
//!
//! Answer text goes to stdout; progress goes to stderr. With `--json`
//! every event is printed to stdout as the same SSE frame the gateway sends.

use std::io::Write;
use std::path::Path;
use tokio_stream::StreamExt;
use vidscout_agent::{AgentEvent, Runtime, TaskKind, TaskRequest};
use vidscout_core::error::ProviderError;

/// Where a rendered event is written.
#[derive(Debug, PartialEq)]
enum Line {
    /// Answer text, printed without a trailing newline.
    Answer(String),
    /// One progress line on stderr.
    Status(String),
}

fn render(event: &AgentEvent) -> Option<Line> {
    let line = match event {
        AgentEvent::RoundStart { round } => Line::Status(format!("  -- round {round} --")),
        AgentEvent::Thinking { text } => Line::Status(format!("  [thinking] {}", text.trim())),
        AgentEvent::Content { text } => Line::Answer(text.clone()),
        AgentEvent::ToolStart { tool, args, .. } => Line::Status(format!("  > {tool} {args}")),
        AgentEvent::ToolProgress { message, .. } => Line::Status(format!("    . {message}")),
        AgentEvent::ToolResult { tool, success, data, .. } => {
            if *success {
                Line::Status(format!("  ok {tool}"))
            } else {
                let reason = data["error"].as_str().unwrap_or("failed");
                Line::Status(format!("  !! {tool}: {reason}"))
            }
        }
        AgentEvent::BatchStart { tool, count } => {
            Line::Status(format!("  >> {count} {tool} calls in parallel"))
        }
        AgentEvent::BatchComplete { total, success, tokens } => {
            Line::Status(format!("  << {success}/{total} succeeded (~{tokens} tokens)"))
        }
        AgentEvent::ReportStart => Line::Status("\n  Writing report...\n".into()),
        AgentEvent::Error { message } => Line::Status(format!("  [Error] {message}")),
        AgentEvent::Done => return None,
    };
    Some(line)
}

fn print_setup_help() {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    VIDSCOUT_API_KEY = 'sk-...'");
    eprintln!("    OPENAI_API_KEY   = 'sk-...'");
    eprintln!();
    eprintln!("  Or run `vidscout config init` and add api_key to the file.");
    eprintln!();
}

pub async fn run(
    config_path: Option<&Path>,
    kind: TaskKind,
    words: Vec<String>,
    context: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let runtime = match Runtime::from_config(&config) {
        Ok(runtime) => runtime,
        Err(e @ ProviderError::NotConfigured(_)) => {
            print_setup_help();
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let mut request = TaskRequest::new(kind, words.join(" "));
    if let Some(context) = context {
        request = request.with_context(serde_json::Value::String(context));
    }

    let mut events = runtime.run(request);
    let mut stdout = std::io::stdout();
    let mut failed = false;

    while let Some(event) = events.next().await {
        failed |= matches!(event, AgentEvent::Error { .. });

        if json {
            write!(stdout, "{}", vidscout_gateway::sse::frame(&event))?;
            stdout.flush()?;
        } else {
            match render(&event) {
                Some(Line::Answer(text)) => {
                    write!(stdout, "{text}")?;
                    stdout.flush()?;
                }
                Some(Line::Status(line)) => eprintln!("{line}"),
                None => println!(),
            }
        }

        if event.is_done() {
            break;
        }
    }

    if failed {
        return Err(format!("{kind} task ended with an error").into());
    }
    Ok(())
}
