//! Server-sent-events framing for agent events.
//!
//! Every event is one `data: <json>\n\n` frame. The stream ends right after
//! the `done` frame.

use futures::{Stream, StreamExt, future};
use std::convert::Infallible;
use vidscout_agent::AgentEvent;

/// Frame one event.
pub fn frame(event: &AgentEvent) -> String {
    let json = serde_json::to_string(event)
        .unwrap_or_else(|_| r#"{"type":"error","message":"event could not be encoded"}"#.to_string());
    format!("data: {json}\n\n")
}

/// Pass events through up to and including the first `done`.
pub fn until_done<S>(events: S) -> impl Stream<Item = AgentEvent>
where
    S: Stream<Item = AgentEvent>,
{
    events.scan(false, |seen_done, event| {
        if *seen_done {
            return future::ready(None);
        }
        *seen_done = event.is_done();
        future::ready(Some(event))
    })
}

/// The response body stream for a task.
pub fn body_stream<S>(events: S) -> impl Stream<Item = Result<String, Infallible>>
where
    S: Stream<Item = AgentEvent>,
{
    until_done(events).map(|event| Ok(frame(&event)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_data_lines() {
        assert_eq!(frame(&AgentEvent::Done), "data: {\"type\":\"done\"}\n\n");
        assert_eq!(
            frame(&AgentEvent::Content { text: "a\nb".into() }),
            "data: {\"type\":\"content\",\"text\":\"a\\nb\"}\n\n"
        );
    }

    #[tokio::test]
    async fn stream_stops_after_done() {
        let events = futures::stream::iter(vec![
            AgentEvent::RoundStart { round: 1 },
            AgentEvent::Done,
            AgentEvent::Content { text: "late".into() },
        ]);
        let frames: Vec<String> = body_stream(events).map(|f| f.unwrap()).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[1].contains("done"));
    }

    #[tokio::test]
    async fn stream_without_done_ends_with_source() {
        let events = futures::stream::iter(vec![AgentEvent::RoundStart { round: 1 }]);
        let frames: Vec<_> = body_stream(events).collect().await;
        assert_eq!(frames.len(), 1);
    }
}
