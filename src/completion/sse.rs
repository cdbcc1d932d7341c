//! Incremental decoder for the server-sent-event framing of streaming
//! completion responses.
//!
//! Network chunks may split frames at arbitrary byte positions, so the
//! decoder buffers until a full line is available and only then interprets
//! it. Only `data:` lines matter here; comments and other fields are
//! ignored, and `data: [DONE]` marks normal termination.

use bytes::BytesMut;

pub(crate) struct SseDecoder {
    buffer: BytesMut,
    terminated: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            terminated: false,
        }
    }

    /// Feed raw bytes, returning the complete `data:` payloads they finish.
    ///
    /// Payloads after the `[DONE]` marker are discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.split_to(newline + 1);
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.strip_prefix(' ').unwrap_or(payload);

            if payload == "[DONE]" {
                self.terminated = true;
            } else if !self.terminated {
                payloads.push(payload.to_string());
            }
        }

        payloads
    }

    /// Whether the `[DONE]` marker has been seen.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}
