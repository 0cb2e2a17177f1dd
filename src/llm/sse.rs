//! Server-sent-event demultiplexer shared by both backends
//!
//! Both backends speak the OpenAI-compatible chat-completions wire protocol:
//! `data:` framed JSON chunks whose `choices[0].delta` carries text content
//! and tool-call fragments, terminated by `data: [DONE]`. This module turns
//! that byte stream into [`StreamEvent`]s without interpreting content.

use futures::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::core::{Result, SceneChatError};
use crate::llm::traits::{EventStream, StreamEvent};

/// Incremental SSE chunk parser.
///
/// Feed it raw network bytes; it buffers partial lines internally and emits
/// events only for complete `data:` frames.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    done: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of bytes, returning all events it completed.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }

        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim_end_matches('\r').to_string();
            self.buffer = self.buffer[newline_pos + 1..].to_string();

            if let Some(event) = self.parse_line(&line) {
                let terminal = event == StreamEvent::End;
                events.push(event);
                if terminal {
                    self.done = true;
                    break;
                }
            }
        }
        events
    }

    /// Close the parser. Emits a synthetic `End` if the upstream never sent
    /// `[DONE]`, so consumers always observe a terminal event.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.done {
            return Vec::new();
        }
        self.done = true;
        vec![StreamEvent::End]
    }

    fn parse_line(&self, line: &str) -> Option<StreamEvent> {
        let data = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:"))?;
        let data = data.trim();

        if data.is_empty() {
            return None;
        }
        if data == "[DONE]" {
            return Some(StreamEvent::End);
        }

        // Malformed chunks are skipped rather than failing the stream.
        let chunk: serde_json::Value = serde_json::from_str(data).ok()?;
        let delta = chunk.get("choices")?.get(0)?.get("delta")?;

        if let Some(content) = delta.get("content").and_then(|v| v.as_str()) {
            if !content.is_empty() {
                return Some(StreamEvent::TextDelta(content.to_string()));
            }
        }

        // Single advertised tool, so only index 0 is ever populated.
        if let Some(tc) = delta
            .get("tool_calls")
            .and_then(|v| v.as_array())
            .and_then(|a| a.first())
        {
            if let Some(function) = tc.get("function") {
                if let Some(name) = function.get("name").and_then(|v| v.as_str()) {
                    if !name.is_empty() {
                        return Some(StreamEvent::ToolCallStart(name.to_string()));
                    }
                }
                if let Some(args) = function.get("arguments").and_then(|v| v.as_str()) {
                    if !args.is_empty() {
                        return Some(StreamEvent::ToolCallArgsDelta(args.to_string()));
                    }
                }
            }
        }

        None
    }
}

/// Drive a response byte stream through the parser on a background task,
/// exposing the events as an [`EventStream`].
///
/// When the consumer drops the returned stream, the first failed send stops
/// the pump task, which drops the HTTP response and releases the connection.
pub fn demux_response(response: reqwest::Response) -> EventStream {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Result<StreamEvent>>();

    tokio::spawn(async move {
        let mut parser = SseParser::new();
        let mut byte_stream = response.bytes_stream();

        while let Some(chunk) = byte_stream.next().await {
            match chunk {
                Ok(bytes) => {
                    for event in parser.push_bytes(&bytes) {
                        let terminal = event == StreamEvent::End;
                        if tx.send(Ok(event)).is_err() {
                            return; // consumer gone
                        }
                        if terminal {
                            return;
                        }
                    }
                }
                Err(e) => {
                    // A broken body mid-stream is retryable upstream.
                    let _ = tx.send(Err(SceneChatError::transient(format!(
                        "stream interrupted: {}",
                        e
                    ))));
                    return;
                }
            }
        }

        for event in parser.finish() {
            if tx.send(Ok(event)).is_err() {
                return;
            }
        }
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(delta: serde_json::Value) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({ "choices": [{ "delta": delta }] })
        )
    }

    #[test]
    fn test_text_deltas() {
        let mut parser = SseParser::new();
        let events = parser.push_bytes(chunk(serde_json::json!({"content": "Hel"})).as_bytes());
        assert_eq!(events, vec![StreamEvent::TextDelta("Hel".into())]);

        let events = parser.push_bytes(chunk(serde_json::json!({"content": "lo"})).as_bytes());
        assert_eq!(events, vec![StreamEvent::TextDelta("lo".into())]);
    }

    #[test]
    fn test_split_across_network_chunks() {
        let mut parser = SseParser::new();
        let line = chunk(serde_json::json!({"content": "xy"}));
        let (a, b) = line.split_at(10);

        assert!(parser.push_bytes(a.as_bytes()).is_empty());
        let events = parser.push_bytes(b.as_bytes());
        assert_eq!(events, vec![StreamEvent::TextDelta("xy".into())]);
    }

    #[test]
    fn test_tool_call_fragments() {
        let mut parser = SseParser::new();

        let start = chunk(serde_json::json!({
            "tool_calls": [{"index": 0, "function": {"name": "get_preview"}}]
        }));
        assert_eq!(
            parser.push_bytes(start.as_bytes()),
            vec![StreamEvent::ToolCallStart("get_preview".into())]
        );

        let args = chunk(serde_json::json!({
            "tool_calls": [{"index": 0, "function": {"arguments": "{\"code\":"}}]
        }));
        assert_eq!(
            parser.push_bytes(args.as_bytes()),
            vec![StreamEvent::ToolCallArgsDelta("{\"code\":".into())]
        );
    }

    #[test]
    fn test_done_marker_ends_stream() {
        let mut parser = SseParser::new();
        let events = parser.push_bytes(b"data: [DONE]\n\n");
        assert_eq!(events, vec![StreamEvent::End]);

        // Nothing after End.
        let events = parser.push_bytes(chunk(serde_json::json!({"content": "x"})).as_bytes());
        assert!(events.is_empty());
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn test_missing_done_yields_synthetic_end() {
        let mut parser = SseParser::new();
        parser.push_bytes(chunk(serde_json::json!({"content": "x"})).as_bytes());
        assert_eq!(parser.finish(), vec![StreamEvent::End]);
    }

    #[test]
    fn test_malformed_chunk_skipped() {
        let mut parser = SseParser::new();
        assert!(parser.push_bytes(b"data: {not json}\n").is_empty());
        assert!(parser.push_bytes(b": keep-alive comment\n").is_empty());
    }
}
