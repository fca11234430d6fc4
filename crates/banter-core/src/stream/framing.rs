//! Byte-chunk reassembly and line classification for the response stream.
//!
//! The endpoint frames its response as `data:`-prefixed lines, but the
//! transport delivers arbitrary byte chunks whose boundaries may fall
//! mid-line or inside a multi-byte UTF-8 sequence. `LineFramer` buffers
//! bytes and only decodes once a full line is available, so assembly is
//! invariant to how the bytes were chunked.

use banter_types::wire::StreamChunk;
use tracing::warn;

/// Reassembles newline-delimited text lines from arbitrarily chunked bytes.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed one chunk; returns the lines it completed, in order.
    ///
    /// Lines are split on `\n` with a trailing `\r` trimmed, so CRLF and
    /// bare-LF framing both work.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let mut line = &self.buf[start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            lines.push(String::from_utf8_lossy(line).into_owned());
            start = end + 1;
        }
        self.buf.drain(..start);
        lines
    }

    /// Drain the unterminated residue after the stream ends.
    ///
    /// A final line without a trailing newline is still a line; callers
    /// classify it like any other.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let mut line: &[u8] = &self.buf;
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        let text = String::from_utf8_lossy(line).into_owned();
        self.buf.clear();
        Some(text)
    }
}

/// Classification of one line of the chunked response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// A delta fragment carried by a `data:` line.
    Fragment(String),
    /// The `data: [DONE]` terminal sentinel.
    Done,
    /// Blank line, comment, or a payload without delta content.
    Ignored,
}

/// Classify a single reassembled line.
///
/// A `data:` payload that fails to decode is logged and skipped rather
/// than aborting the stream; a single mangled chunk must not lose the
/// whole response.
pub fn decode_line(line: &str) -> SseLine {
    let Some(payload) = line.strip_prefix("data: ") else {
        return SseLine::Ignored;
    };
    if payload.trim() == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => match chunk.delta_text() {
            Some(text) => SseLine::Fragment(text.to_string()),
            None => SseLine::Ignored,
        },
        Err(err) => {
            warn!(error = %err, "skipping undecodable stream line");
            SseLine::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta_line(text: &str) -> String {
        format!(r#"data: {{"choices":[{{"delta":{{"content":"{text}"}}}}]}}"#)
    }

    #[test]
    fn complete_lines_in_one_chunk() {
        let mut framer = LineFramer::new();
        let lines = framer.push(b"first\nsecond\n");
        assert_eq!(lines, vec!["first", "second"]);
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn line_split_across_chunks() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"hel").is_empty());
        assert!(framer.push(b"lo wor").is_empty());
        assert_eq!(framer.push(b"ld\n"), vec!["hello world"]);
    }

    #[test]
    fn crlf_terminators_are_trimmed() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"alpha\r\nbeta\r\n"), vec!["alpha", "beta"]);
    }

    #[test]
    fn multibyte_utf8_split_across_chunks() {
        // Snowman is three bytes (E2 98 83) starting at offset 10; cutting
        // at 11 leaves one byte of it in the first chunk.
        let encoded = "data: snow\u{2603}man\n".as_bytes();
        let (a, b) = encoded.split_at(11);
        let mut framer = LineFramer::new();
        assert!(framer.push(a).is_empty());
        let lines = framer.push(b);
        assert_eq!(lines, vec!["data: snow\u{2603}man"]);
    }

    #[test]
    fn single_byte_chunks() {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for byte in b"data: one\ndata: two\n" {
            lines.extend(framer.push(&[*byte]));
        }
        assert_eq!(lines, vec!["data: one", "data: two"]);
    }

    #[test]
    fn finish_yields_unterminated_residue() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.push(b"complete\npartial"), vec!["complete"]);
        assert_eq!(framer.finish(), Some("partial".to_string()));
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn decode_fragment_line() {
        assert_eq!(
            decode_line(&delta_line("Hel")),
            SseLine::Fragment("Hel".to_string())
        );
    }

    #[test]
    fn decode_done_sentinel() {
        assert_eq!(decode_line("data: [DONE]"), SseLine::Done);
    }

    #[test]
    fn decode_ignores_blank_and_comment_lines() {
        assert_eq!(decode_line(""), SseLine::Ignored);
        assert_eq!(decode_line(": keep-alive"), SseLine::Ignored);
        assert_eq!(decode_line("event: ping"), SseLine::Ignored);
    }

    #[test]
    fn decode_ignores_payload_without_content() {
        assert_eq!(
            decode_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Ignored
        );
        assert_eq!(
            decode_line(r#"data: {"choices":[{"delta":{}},{"finish_reason":"stop"}]}"#),
            SseLine::Ignored
        );
    }

    #[test]
    fn decode_skips_malformed_json() {
        assert_eq!(decode_line("data: {not json"), SseLine::Ignored);
    }

    #[test]
    fn decode_preserves_fragment_whitespace() {
        assert_eq!(
            decode_line(&delta_line(" fine")),
            SseLine::Fragment(" fine".to_string())
        );
    }
}
