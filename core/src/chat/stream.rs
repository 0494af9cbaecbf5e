//! Streaming primitives shared by all providers.
//!
//! Backends deliver generated text incrementally, either as newline-delimited JSON records or
//! as server-sent events. Both formats are line oriented, so the pipeline is the same:
//!
//! 1. [`lines`] reassembles complete lines from arbitrary byte chunks.
//! 2. [`decode_lines`] turns each line into zero or more [`Fragment`]s using a backend-specific
//!    decoder. Lines the decoder cannot make sense of simply produce no fragments.
//! 3. [`collect_fragments`] concatenates the text until the stream signals completion.

use std::{collections::VecDeque, pin::Pin};

use futures::stream::{self, Stream, StreamExt};
use tracing::trace;

use super::ChatError;

/// Literal sentinel some servers send to mark the end of a stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One incremental unit of a streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A piece of generated text.
    Text(String),
    /// The backend signalled that generation is complete.
    Done,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Fragment::Text(text.into())
    }
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, ChatError>> + Send>>;

struct LineBuffer<S> {
    inner: Pin<Box<S>>,
    pending: Vec<u8>,
    ready: VecDeque<String>,
    exhausted: bool,
}

impl<S> LineBuffer<S> {
    fn push(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            self.ready.extend(decode_line(line));
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.ready.extend(decode_line(rest));
        }
    }
}

/// Lines that are not valid UTF-8 are dropped.
fn decode_line(mut line: Vec<u8>) -> Option<String> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    match String::from_utf8(line) {
        Ok(line) => Some(line),
        Err(e) => {
            trace!(error = %e, "Skipping line that is not valid UTF-8");
            None
        }
    }
}

/// Splits a stream of byte chunks into lines.
///
/// Chunk boundaries are arbitrary: a record may be split across several chunks, or several
/// records may arrive in one chunk. A trailing line without a newline is emitted when the
/// underlying stream ends. Lines that are not valid UTF-8 are skipped. Errors from the
/// underlying stream are passed through and end the line stream.
pub fn lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, E>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Send,
{
    let state = LineBuffer {
        inner: Box::pin(bytes),
        pending: Vec::new(),
        ready: VecDeque::new(),
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.ready.pop_front() {
                return Some((Ok(line), state));
            }
            if state.exhausted {
                return None;
            }
            match state.inner.next().await {
                Some(Ok(chunk)) => state.push(chunk.as_ref()),
                Some(Err(e)) => {
                    state.exhausted = true;
                    state.pending.clear();
                    return Some((Err(e), state));
                }
                None => {
                    state.exhausted = true;
                    state.flush();
                }
            }
        }
    })
}

/// Removes an optional server-sent-event `data:` prefix from a line.
pub fn strip_event_prefix(line: &str) -> &str {
    match line.strip_prefix("data:") {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => line,
    }
}

/// Maps a line stream to a fragment stream using a backend-specific decoder.
pub fn decode_lines<S, E, F>(lines: S, decode: F) -> FragmentStream
where
    S: Stream<Item = Result<String, E>> + Send + 'static,
    E: Into<ChatError> + Send + 'static,
    F: Fn(&str) -> Vec<Fragment> + Send + 'static,
{
    Box::pin(lines.flat_map(move |line| {
        let items: Vec<Result<Fragment, ChatError>> = match line {
            Ok(line) => decode(&line).into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e.into())],
        };
        stream::iter(items)
    }))
}

/// Drains a fragment stream into a single string.
///
/// Text is concatenated in arrival order. Consumption stops at the first [`Fragment::Done`]
/// (later items are never polled) or when the stream ends. The first error aborts the
/// aggregation and is returned.
pub async fn collect_fragments(mut stream: FragmentStream) -> Result<String, ChatError> {
    let mut text = String::new();
    let mut count = 0usize;
    while let Some(item) = stream.next().await {
        match item? {
            Fragment::Text(piece) => {
                count += 1;
                text.push_str(&piece);
            }
            Fragment::Done => {
                trace!(fragments = count, "Completion signal received, closing stream");
                return Ok(text);
            }
        }
    }
    trace!(fragments = count, "Stream ended");
    Ok(text)
}
