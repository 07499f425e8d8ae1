//! Server-sent events framing used by the push channels over HTTP.
//!
//! Frames are `event:` and `data:` lines followed by a blank line. Lines starting with `:` are
//! comments.
use thiserror::Error;

/// Event name announcing that the server skipped events for a slow subscriber.
pub const LAGGED_EVENT: &str = "lagged";

/// Default cap on the size of a single frame.
pub const MAX_FRAME_LEN: usize = 1 << 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("server-sent event frame exceeds {0} bytes")]
pub struct FrameTooLarge(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

pub fn encode_frame(event: &str, data: &str) -> String {
    let mut frame = format!("event: {}\n", event);
    for line in data.lines() {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

pub fn encode_comment(comment: &str) -> String {
    format!(": {}\n\n", comment)
}

/// Incremental decoder for a byte stream of frames.
///
/// Chunk boundaries may fall anywhere, including inside a UTF-8 sequence. Bytes already searched
/// for a frame end are not searched again.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    scanned: usize,
    max_frame_len: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_frame_len(MAX_FRAME_LEN)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        SseDecoder {
            buffer: Vec::new(),
            scanned: 0,
            max_frame_len,
        }
    }

    /// Feed a chunk and return every frame it completes.
    ///
    /// Fails once an unfinished frame grows past the cap. The partial frame is discarded.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseFrame>, FrameTooLarge> {
        self.buffer
            .extend(chunk.iter().copied().filter(|b| *b != b'\r'));
        let mut frames = Vec::new();
        while let Some(offset) = self.buffer[self.scanned..]
            .windows(2)
            .position(|w| w == b"\n\n")
        {
            let end = self.scanned + offset + 2;
            let raw: Vec<u8> = self.buffer.drain(..end).collect();
            self.scanned = 0;
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw)) {
                frames.push(frame);
            }
        }
        // The last byte may be the first half of a terminator
        self.scanned = self.buffer.len().saturating_sub(1);
        if self.buffer.len() > self.max_frame_len {
            self.buffer.clear();
            self.scanned = 0;
            return Err(FrameTooLarge(self.max_frame_len));
        }
        Ok(frames)
    }
}

fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();
    for line in raw.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => event = Some(value.to_owned()),
            "data" => data.push(value),
            _ => {}
        }
    }
    if data.is_empty() {
        None
    } else {
        Some(SseFrame {
            event,
            data: data.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_split_across_chunks() {
        let encoded = format!(
            "{}{}{}",
            encode_comment("subscribed created"),
            encode_frame("created", r#"{"id":"n1","text":"café"}"#),
            encode_frame("created", r#"{"id":"n2","text":"tea"}"#)
        );
        let bytes = encoded.as_bytes();
        let mut decoder = SseDecoder::new();
        let mut frames = Vec::new();
        for chunk in bytes.chunks(5) {
            frames.extend(decoder.push(chunk).unwrap());
        }
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event.as_deref(), Some("created"));
        assert_eq!(frames[0].data, r#"{"id":"n1","text":"café"}"#);
        assert_eq!(frames[1].data, r#"{"id":"n2","text":"tea"}"#);
    }

    #[test]
    fn crlf_and_multiline_data() {
        let mut decoder = SseDecoder::new();
        let frames = decoder
            .push(b"event: lagged\r\ndata: 3\r\ndata: 4\r\n\r\n")
            .unwrap();
        assert_eq!(
            frames,
            vec![SseFrame {
                event: Some(LAGGED_EVENT.to_owned()),
                data: "3\n4".to_owned()
            }]
        );
    }

    #[test]
    fn terminator_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: created\ndata: 1\n").unwrap().is_empty());
        let frames = decoder.push(b"\nevent: created\ndata: 2\n\n").unwrap();
        let data: Vec<_> = frames.iter().map(|f| f.data.as_str()).collect();
        assert_eq!(data, vec!["1", "2"]);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut decoder = SseDecoder::with_max_frame_len(16);
        assert!(decoder.push(b"data: 0123").unwrap().is_empty());
        assert_eq!(decoder.push(b"456789abcdef"), Err(FrameTooLarge(16)));

        assert_eq!(decoder.push(b"\n\ndata: ok\n\n").unwrap().len(), 1);
    }
}
