//! Incremental parser for `text/event-stream` bodies.
//!
//! Network chunks do not align with event boundaries, so the parser buffers
//! at most one incomplete line between `feed` calls and surfaces complete
//! `data:` payloads in arrival order.

/// Terminal sentinel payload used by OpenAI-style streams and by our own
/// outward protocol.
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Default)]
pub struct SseParser {
    buf: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of the response body, returning the `data:` payloads it
    /// completed. Comment lines, event-name lines, and blank separators are
    /// skipped.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buf.push_str(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }
}

fn data_payload(line: &str) -> Option<String> {
    let payload = line.trim().strip_prefix("data:")?.trim();
    (!payload.is_empty()).then(|| payload.to_string())
}
