// Completion-service client: streamed structured-JSON responses from
// the OpenAI responses API.

use std::fmt;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{LlmError, Result};

/// One event off the completion-service stream, discriminated by the
/// wire `type` tag.
///
/// Only text deltas matter to the reducer; every other event kind
/// collapses into [`StreamEvent::Other`] so the reducer's match stays
/// exhaustive without enumerating the provider's full event zoo.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// An incremental text fragment of the response being generated.
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { delta: String },
    /// Any other event kind (lifecycle, usage, reasoning, ...).
    #[serde(other)]
    Other,
}

/// Seam for the completion service, so the pipeline can be exercised
/// against scripted event streams.
#[async_trait]
pub trait CompletionProvider: Send + Sync + fmt::Debug {
    /// Asynchronous setup that must complete before prompt
    /// construction begins. Fails fast on missing configuration.
    async fn prepare(&self) -> Result<()>;

    /// Request a streamed structured-JSON completion for `prompt`.
    async fn stream_response(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>>;
}

// ── OpenAI Client ───────────────────────────────────────────────────

#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn prepare(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(LlmError::Config("missing API key".to_string()).into());
        }
        Ok(())
    }

    async fn stream_response(
        &self,
        model: &str,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let url = format!("{}/v1/responses", self.base_url);
        let body = json!({
            "model": model,
            "input": prompt,
            "text": { "format": { "type": "json_object" } },
            "reasoning": { "effort": "low" },
            "stream": true,
        });

        debug!(model, prompt_len = prompt.len(), "Requesting idea stream");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body }.into());
        }

        Ok(sse_events(resp.bytes_stream().boxed()).boxed())
    }
}

// ── SSE Framing ─────────────────────────────────────────────────────

/// Split a raw byte stream into SSE frames and decode each frame's
/// data payload as a [`StreamEvent`].
///
/// The byte buffer is only converted to text per complete frame, so
/// chunk boundaries inside multi-byte characters are harmless.
fn sse_events<B, C, E>(bytes: B) -> impl Stream<Item = Result<StreamEvent>>
where
    B: Stream<Item = std::result::Result<C, E>> + Unpin,
    C: AsRef<[u8]>,
    E: fmt::Display,
{
    let state = SseState {
        bytes,
        buf: Vec::new(),
        eof: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = take_frame(&mut state.buf) {
                if let Some(payload) = frame_payload(&frame) {
                    return Some((decode_event(&payload), state));
                }
                continue;
            }

            if state.eof {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => state.buf.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    return Some((Err(LlmError::Network(e.to_string()).into()), state));
                }
                None => state.eof = true,
            }
        }
    })
}

struct SseState<B> {
    bytes: B,
    buf: Vec<u8>,
    eof: bool,
}

/// Pop one complete frame (up to a blank line) off the buffer.
fn take_frame(buf: &mut Vec<u8>) -> Option<String> {
    let end = buf.windows(2).position(|w| w == b"\n\n")?;
    let frame: Vec<u8> = buf.drain(..end + 2).collect();
    Some(String::from_utf8_lossy(&frame).into_owned())
}

/// Join a frame's `data:` lines. `None` for comment-only frames and
/// the `[DONE]` sentinel.
fn frame_payload(frame: &str) -> Option<String> {
    let data: Vec<&str> = frame
        .lines()
        .filter_map(|line| {
            line.strip_prefix("data:")
                .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
        })
        .collect();

    if data.is_empty() {
        return None;
    }
    let payload = data.join("\n");
    if payload == "[DONE]" {
        return None;
    }
    Some(payload)
}

fn decode_event(payload: &str) -> Result<StreamEvent> {
    serde_json::from_str(payload).map_err(|e| LlmError::Parse(e.to_string()).into())
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IssueGraphError;

    #[test]
    fn delta_event_deserializes() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type": "response.output_text.delta", "delta": "{\"ideas\":"}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            StreamEvent::OutputTextDelta {
                delta: "{\"ideas\":".to_string()
            }
        );
    }

    #[test]
    fn unknown_events_collapse_to_other() {
        for payload in [
            r#"{"type": "response.created", "response": {}}"#,
            r#"{"type": "response.completed", "usage": {"total_tokens": 10}}"#,
            r#"{"type": "response.output_text.done", "text": "..."}"#,
        ] {
            let event: StreamEvent = serde_json::from_str(payload).unwrap();
            assert_eq!(event, StreamEvent::Other);
        }
    }

    #[test]
    fn frame_payload_joins_data_lines() {
        let frame = "event: message\ndata: {\"a\":\ndata: 1}\n\n";
        assert_eq!(frame_payload(frame).unwrap(), "{\"a\":\n1}");
    }

    #[test]
    fn frame_payload_skips_comments_and_done() {
        assert!(frame_payload(": keep-alive\n\n").is_none());
        assert!(frame_payload("data: [DONE]\n\n").is_none());
    }

    #[test]
    fn take_frame_requires_a_blank_line() {
        let mut buf = b"data: partial".to_vec();
        assert!(take_frame(&mut buf).is_none());

        buf.extend_from_slice(b"\n\ndata: next");
        let frame = take_frame(&mut buf).unwrap();
        assert_eq!(frame, "data: partial\n\n");
        assert_eq!(buf, b"data: next");
    }

    #[tokio::test]
    async fn sse_stream_decodes_frames_in_order() {
        // Chunk boundaries deliberately split frames mid-line.
        let chunks: Vec<std::result::Result<&[u8], std::io::Error>> = vec![
            Ok(b"data: {\"type\": \"response.created\"}\n\ndata: {\"type\": \"resp"),
            Ok(b"onse.output_text.delta\", \"delta\": \"hi\"}\n\nda"),
            Ok(b"ta: [DONE]\n\n"),
        ];

        let events: Vec<Result<StreamEvent>> =
            sse_events(stream::iter(chunks)).collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(*events[0].as_ref().unwrap(), StreamEvent::Other);
        assert_eq!(
            *events[1].as_ref().unwrap(),
            StreamEvent::OutputTextDelta {
                delta: "hi".to_string()
            }
        );
    }

    #[tokio::test]
    async fn malformed_frame_yields_parse_error_then_continues() {
        let chunks: Vec<std::result::Result<&[u8], std::io::Error>> = vec![
            Ok(b"data: not json\n\n"),
            Ok(b"data: {\"type\": \"response.output_text.delta\", \"delta\": \"x\"}\n\n"),
        ];

        let events: Vec<Result<StreamEvent>> =
            sse_events(stream::iter(chunks)).collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Err(IssueGraphError::Llm(LlmError::Parse(_)))
        ));
        assert!(events[1].is_ok());
    }

    #[tokio::test]
    async fn prepare_rejects_missing_api_key() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let client = OpenAiClient::new(String::new());
        let err = client.prepare().await.unwrap_err();
        assert!(matches!(err, IssueGraphError::Llm(LlmError::Config(_))));

        let client = OpenAiClient::new("sk-test".to_string());
        assert!(client.prepare().await.is_ok());
    }

    #[tokio::test]
    async fn connect_failure_is_a_network_error() {
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let client = OpenAiClient::new("sk-test".to_string())
            .with_base_url("http://127.0.0.1:1".to_string());
        let err = client
            .stream_response("o3-mini", "prompt")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, IssueGraphError::Llm(LlmError::Network(_))));
    }
}
