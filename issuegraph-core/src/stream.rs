//! Streaming response reducer: turns the completion service's
//! incremental text deltas into fully-decoded idea drafts, one per
//! array element, without waiting for the whole document to finish.
//!
//! The expected document shape is `{"ideas": [{...}, {...}, ...]}`, but
//! the decoder is structural: it captures any object that opens as a
//! direct element of an array and decodes it the moment its closing
//! brace arrives.

use futures_util::{Stream, StreamExt, pin_mut};
use tracing::{debug, warn};

use crate::error::Result;
use crate::llm::StreamEvent;
use crate::session::IdeaDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

#[derive(Debug)]
struct Capture {
    buf: Vec<u8>,
    /// Container-stack depth just before the captured object opened.
    depth: usize,
}

/// Incremental decoder for idea objects embedded in a JSON text stream.
///
/// Chunks may split UTF-8 sequences, string escapes, or structural
/// characters at any boundary: the scanner works on raw bytes, and the
/// structural characters it cares about are all ASCII, so multi-byte
/// characters pass through untouched inside captures and strings.
#[derive(Debug, Default)]
pub struct IdeaStreamDecoder {
    containers: Vec<Container>,
    in_string: bool,
    escaped: bool,
    capture: Option<Capture>,
}

impl IdeaStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every idea that became complete
    /// within it.
    ///
    /// A captured object that fails to decode (or lacks a string
    /// `title`) is logged and dropped; scanning state is preserved so
    /// later valid ideas still emit.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<IdeaDraft> {
        let mut completed = Vec::new();

        for &byte in chunk {
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                self.append(byte);
                continue;
            }

            match byte {
                b'"' => {
                    self.in_string = true;
                    self.append(byte);
                }
                b'{' => {
                    if self.capture.is_none()
                        && self.containers.last() == Some(&Container::Array)
                    {
                        self.capture = Some(Capture {
                            buf: Vec::new(),
                            depth: self.containers.len(),
                        });
                    }
                    self.containers.push(Container::Object);
                    self.append(byte);
                }
                b'[' => {
                    self.containers.push(Container::Array);
                    self.append(byte);
                }
                b'}' => {
                    self.append(byte);
                    self.containers.pop();
                    let complete = self
                        .capture
                        .as_ref()
                        .is_some_and(|c| self.containers.len() <= c.depth);
                    if complete {
                        if let Some(capture) = self.capture.take() {
                            if let Some(draft) = decode_capture(&capture.buf) {
                                completed.push(draft);
                            }
                        }
                    }
                }
                b']' => {
                    self.containers.pop();
                    self.append(byte);
                }
                _ => self.append(byte),
            }
        }

        completed
    }

    fn append(&mut self, byte: u8) {
        if let Some(capture) = &mut self.capture {
            capture.buf.push(byte);
        }
    }
}

fn decode_capture(buf: &[u8]) -> Option<IdeaDraft> {
    match serde_json::from_slice::<IdeaDraft>(buf) {
        Ok(draft) => {
            debug!(title = %draft.title, "Idea decoded from stream");
            Some(draft)
        }
        Err(e) => {
            // Per-fragment failure isolation: log and keep scanning.
            warn!(error = %e, "Discarding malformed idea fragment");
            None
        }
    }
}

/// Consume a completion-service event stream, forwarding delta payloads
/// into the decoder and invoking `on_idea` once per completed draft.
///
/// Non-delta events are ignored; errored frames are logged and skipped
/// so one bad frame never suppresses later ideas. The reduction ends
/// when the upstream stream ends. Returns the number of ideas emitted.
pub async fn reduce_idea_stream<S, F>(events: S, mut on_idea: F) -> usize
where
    S: Stream<Item = Result<StreamEvent>>,
    F: FnMut(IdeaDraft),
{
    let mut decoder = IdeaStreamDecoder::new();
    let mut emitted = 0usize;

    pin_mut!(events);
    while let Some(event) = events.next().await {
        match event {
            Ok(StreamEvent::OutputTextDelta { delta }) => {
                for draft in decoder.push(delta.as_bytes()) {
                    emitted += 1;
                    on_idea(draft);
                }
            }
            Ok(StreamEvent::Other) => {}
            Err(e) => {
                warn!(error = %e, "Skipping errored stream frame");
            }
        }
    }

    emitted
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use proptest::prelude::*;

    const RESPONSE: &str = r#"{"ideas": [
        {"title": "Unified search", "description": "Search issues and docs together", "sourceIds": [4, 9]},
        {"title": "Label triage bot", "description": "Auto-label new issues", "sourceIds": [12]},
        {"title": "Graph snapshots", "description": "Diff the issue graph over time", "sourceIds": []}
    ]}"#;

    fn decode_all(chunks: &[&[u8]]) -> Vec<IdeaDraft> {
        let mut decoder = IdeaStreamDecoder::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(decoder.push(chunk));
        }
        out
    }

    #[test]
    fn whole_document_in_one_chunk() {
        let ideas = decode_all(&[RESPONSE.as_bytes()]);
        assert_eq!(ideas.len(), 3);
        assert_eq!(ideas[0].title, "Unified search");
        assert_eq!(ideas[0].source_ids, vec![4, 9]);
        assert_eq!(ideas[2].title, "Graph snapshots");
        assert!(ideas[2].source_ids.is_empty());
    }

    #[test]
    fn byte_at_a_time_matches_one_chunk() {
        let whole = decode_all(&[RESPONSE.as_bytes()]);
        let chunks: Vec<&[u8]> = RESPONSE.as_bytes().chunks(1).collect();
        assert_eq!(decode_all(&chunks), whole);
    }

    #[test]
    fn ideas_emit_before_the_document_completes() {
        let mut decoder = IdeaStreamDecoder::new();
        let first = r#"{"ideas": [{"title": "Early", "sourceIds": [1]},"#;
        let ideas = decoder.push(first.as_bytes());
        // The first element is complete even though the array is not.
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Early");

        let rest = r#" {"title": "Late"}]}"#;
        let ideas = decoder.push(rest.as_bytes());
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Late");
    }

    #[test]
    fn split_inside_a_multibyte_character() {
        let doc = r#"{"ideas": [{"title": "Prioritätenliste", "sourceIds": []}]}"#.as_bytes();
        // Split in the middle of the two-byte "ä".
        let split = doc.iter().position(|&b| b >= 0x80).unwrap() + 1;
        let ideas = decode_all(&[&doc[..split], &doc[split..]]);
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Prioritätenliste");
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_the_scanner() {
        let doc = r#"{"ideas": [{"title": "Use {braces} and \"quotes\" and ]", "sourceIds": []}]}"#;
        let ideas = decode_all(&[doc.as_bytes()]);
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, r#"Use {braces} and "quotes" and ]"#);
    }

    #[test]
    fn malformed_fragment_does_not_suppress_neighbors() {
        // Middle element has a non-string title, so it fails to decode;
        // the elements before and after must still emit.
        let doc = r#"{"ideas": [
            {"title": "Before", "sourceIds": []},
            {"title": 42},
            {"title": "After", "sourceIds": [7]}
        ]}"#;
        let ideas = decode_all(&[doc.as_bytes()]);
        let titles: Vec<&str> = ideas.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Before", "After"]);
    }

    #[test]
    fn objects_outside_arrays_are_not_captured() {
        // The root object and nested non-array objects never decode.
        let doc = r#"{"meta": {"title": "Not an idea"}, "ideas": [{"title": "Real"}]}"#;
        let ideas = decode_all(&[doc.as_bytes()]);
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Real");
    }

    #[test]
    fn nested_objects_stay_inside_their_capture() {
        // An object nested within an array element must not terminate
        // the capture early.
        let doc = r#"[{"title": "Outer", "extra": {"inner": [1, 2]}, "sourceIds": []}]"#;
        let ideas = decode_all(&[doc.as_bytes()]);
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].title, "Outer");
    }

    proptest! {
        #[test]
        fn arbitrary_chunking_is_idempotent(cuts in prop::collection::vec(0..RESPONSE.len(), 0..12)) {
            let mut cuts = cuts;
            cuts.sort_unstable();
            cuts.dedup();

            let bytes = RESPONSE.as_bytes();
            let mut chunks: Vec<&[u8]> = Vec::new();
            let mut start = 0;
            for cut in cuts {
                chunks.push(&bytes[start..cut]);
                start = cut;
            }
            chunks.push(&bytes[start..]);

            prop_assert_eq!(decode_all(&chunks), decode_all(&[bytes]));
        }
    }

    // ── Reducer ─────────────────────────────────────────────────────

    fn delta(text: &str) -> Result<StreamEvent> {
        Ok(StreamEvent::OutputTextDelta {
            delta: text.to_string(),
        })
    }

    #[tokio::test]
    async fn reducer_collects_ideas_across_deltas() {
        let events = stream::iter(vec![
            Ok(StreamEvent::Other),
            delta(r#"{"ideas": [{"title": "One", "sour"#),
            delta(r#"ceIds": [3]}, {"ti"#),
            Ok(StreamEvent::Other),
            delta(r#"tle": "Two"}]}"#),
        ]);

        let mut titles = Vec::new();
        let emitted = reduce_idea_stream(events, |draft| titles.push(draft.title)).await;
        assert_eq!(emitted, 2);
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn errored_frames_are_skipped_not_fatal() {
        let events = stream::iter(vec![
            delta(r#"{"ideas": [{"title": "One"},"#),
            Err(crate::error::LlmError::Parse("bad frame".to_string()).into()),
            delta(r#"{"title": "Two"}]}"#),
        ]);

        let mut titles = Vec::new();
        reduce_idea_stream(events, |draft| titles.push(draft.title)).await;
        assert_eq!(titles, vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn empty_stream_emits_nothing() {
        let events = stream::iter(Vec::<Result<StreamEvent>>::new());
        let emitted = reduce_idea_stream(events, |_| panic!("no ideas expected")).await;
        assert_eq!(emitted, 0);
    }
}
