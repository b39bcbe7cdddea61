//! Server-sent event framing for streamed replies.
//!
//! Network chunks do not line up with event boundaries: one chunk may carry
//! several events, and one event may be split across chunks. [`SseLineBuffer`]
//! accumulates bytes and only yields `data:` payloads from complete lines.

use std::collections::VecDeque;
use std::mem;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::unfold;
use futures_util::{Stream, StreamExt};

use crate::error::{BloomError, Result};

#[derive(Debug, Default)]
pub struct SseLineBuffer {
    // Raw bytes; a chunk may end inside a multi-byte character.
    buffer: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the payloads of every line it completed.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            if let Some(data) = data_payload(&String::from_utf8_lossy(&line)) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Drain whatever is left once the byte stream has ended.
    pub fn flush(&mut self) -> Option<String> {
        let remaining = mem::take(&mut self.buffer);
        data_payload(&String::from_utf8_lossy(&remaining))
    }
}

// Non-data fields (event:, id:, retry:, comments) are ignored.
fn data_payload(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let data = trimmed
        .strip_prefix("data:")
        .map(|d| d.strip_prefix(' ').unwrap_or(d))?;
    if data.trim().is_empty() {
        None
    } else {
        Some(data.to_string())
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send>>;

struct SseState<F> {
    bytes: ByteStream,
    parser: SseLineBuffer,
    pending: VecDeque<Result<String>>,
    parse: F,
    ended: bool,
}

/// Turn a response byte stream into a stream of parsed events.
///
/// `parse` maps one `data:` payload to an item; `None` skips the event.
/// A read error is yielded once as `StreamInterrupted` and ends the stream.
pub fn sse_stream<S, F>(byte_stream: S, parse: F) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Send + 'static,
    F: Fn(&str) -> Option<Result<String>> + Send + 'static,
{
    let state = SseState {
        bytes: Box::pin(byte_stream),
        parser: SseLineBuffer::new(),
        pending: VecDeque::new(),
        parse,
        ended: false,
    };

    let stream = unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.ended {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for payload in state.parser.feed(&chunk) {
                        if let Some(item) = (state.parse)(&payload) {
                            state.pending.push_back(item);
                        }
                    }
                }
                Some(Err(e)) => {
                    state.ended = true;
                    state.pending.clear();
                    return Some((
                        Err(BloomError::StreamInterrupted(format!("stream read error: {e}"))),
                        state,
                    ));
                }
                None => {
                    state.ended = true;
                    if let Some(payload) = state.parser.flush() {
                        if let Some(item) = (state.parse)(&payload) {
                            state.pending.push_back(item);
                        }
                    }
                }
            }
        }
    });

    Box::pin(stream)
}
