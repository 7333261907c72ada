//! Incremental decoder for server-push frames.
//!
//! Frames are newline-terminated lines beginning with `data:` followed by a
//! JSON object. Every other line (comments, `event:`, `id:`, blank
//! separators) is ignored, and a `data:` line that does not decode to an
//! object is skipped rather than failing the stream.

use bytes::BytesMut;
use integration_primitives::Payload;
use tracing::debug;

const DATA_PREFIX: &str = "data:";

/// Accumulates raw body chunks and yields decoded push events.
#[derive(Debug, Default)]
pub(crate) struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feeds a body chunk, returning every event completed by it.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<Payload> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = self.buffer.split_to(pos + 1);
            if let Some(event) = decode_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a trailing line that was not newline-terminated.
    pub(crate) fn finish(&mut self) -> Option<Payload> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = self.buffer.split();
        decode_line(&line)
    }
}

fn decode_line(raw: &[u8]) -> Option<Payload> {
    let Ok(line) = std::str::from_utf8(raw) else {
        debug!("skipping push line with invalid utf-8");
        return None;
    };
    let line = line.trim_end_matches(['\r', '\n']);
    let data = line.strip_prefix(DATA_PREFIX)?.trim_start();

    match serde_json::from_str::<Payload>(data) {
        Ok(event) => Some(event),
        Err(err) => {
            debug!(%err, "skipping malformed push frame");
            None
        }
    }
}
