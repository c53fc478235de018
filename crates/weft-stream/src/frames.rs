//! # Frame reader
//!
//! Splits a chunked byte stream into JSON values ahead of the decoder.
//! Accepts both newline-delimited JSON (the Claude CLI's `stream-json`
//! output) and SSE framing (`data:` lines), so recorded streams of either
//! shape replay the same way:
//! - line buffering across chunk boundaries, CRLF tolerated
//! - `data:` prefix extraction; `event:`, `id:`, `retry:` and `:` comment
//!   lines skipped
//! - `[DONE]` markers skipped
//! - the trailing unterminated line flushed when the stream ends
//! - lines longer than [`MAX_LINE_BYTES`] logged and discarded

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::warn;
use weft_core::text::truncate_str;

use crate::errors::TransportError;

/// SSE field lines that carry no payload.
const SKIPPED_FIELDS: [&str; 3] = ["event:", "id:", "retry:"];

/// Longest line kept in memory. Longer lines are logged and discarded.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

struct ReaderState<S> {
    stream: S,
    buffer: BytesMut,
    /// Bytes at the front of `buffer` already known to hold no newline.
    scanned: usize,
    /// Inside an over-long line; drop bytes until its newline.
    discarding: bool,
    done: bool,
}

/// Adapt a byte stream into a stream of JSON frames.
///
/// Lines that are not valid JSON are logged and skipped. A transport error is
/// yielded once and ends the stream.
pub fn json_frames<S, E>(byte_stream: S) -> impl Stream<Item = Result<Value, TransportError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Into<TransportError> + Send,
{
    json_frames_with_limit(byte_stream, MAX_LINE_BYTES)
}

/// [`json_frames`] with an explicit maximum line length in bytes.
pub fn json_frames_with_limit<S, E>(
    byte_stream: S,
    max_line_bytes: usize,
) -> impl Stream<Item = Result<Value, TransportError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Into<TransportError> + Send,
{
    let initial = ReaderState {
        stream: byte_stream,
        buffer: BytesMut::with_capacity(8192),
        scanned: 0,
        discarding: false,
        done: false,
    };

    futures::stream::unfold(initial, move |mut state| async move {
        if state.done {
            return None;
        }

        loop {
            let found = state.buffer[state.scanned..].iter().position(|&b| b == b'\n');
            if let Some(offset) = found {
                let newline_pos = state.scanned + offset;
                let mut line = state.buffer.split_to(newline_pos + 1);
                state.scanned = 0;
                if state.discarding {
                    state.discarding = false;
                    continue;
                }
                line.truncate(newline_pos);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }
                if let Some(value) = decode_line(&line) {
                    return Some((Ok(value), state));
                }
                continue;
            }
            state.scanned = state.buffer.len();

            if state.buffer.len() > max_line_bytes {
                if !state.discarding {
                    warn!(
                        limit = max_line_bytes,
                        data_preview = %String::from_utf8_lossy(&state.buffer[..state.buffer.len().min(100)]),
                        "frame line exceeds the maximum length, discarding it"
                    );
                }
                state.discarding = true;
                state.buffer.clear();
                state.scanned = 0;
            }

            match state.stream.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    let error: TransportError = e.into();
                    warn!(error = %error, "frame stream read error");
                    state.done = true;
                    return Some((Err(error), state));
                }
                None => {
                    if state.discarding || state.buffer.is_empty() {
                        return None;
                    }
                    let rest = state.buffer.split();
                    state.done = true;
                    return decode_line(&rest).map(|value| (Ok(value), state));
                }
            }
        }
    })
}

/// Decode one line into a JSON value.
///
/// Returns `None` for blank lines, comments, non-data SSE fields, `[DONE]`
/// markers and lines that fail to parse.
fn decode_line(bytes: &[u8]) -> Option<Value> {
    let Ok(line) = std::str::from_utf8(bytes) else {
        warn!(len = bytes.len(), "skipping frame line that is not UTF-8");
        return None;
    };
    let line = line.trim();

    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    if SKIPPED_FIELDS.iter().any(|field| line.starts_with(field)) {
        return None;
    }

    let data = line.strip_prefix("data:").map_or(line, str::trim);
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    match serde_json::from_str(data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                error = %e,
                data_preview = truncate_str(data, 100),
                "skipping frame line that is not valid JSON"
            );
            None
        }
    }
}
