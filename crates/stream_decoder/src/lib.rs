use serde_json::Value;

const DATA_PREFIX: &[u8] = b"data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder for the assistant's completion stream.
///
/// The transport delivers arbitrary byte chunks; lines can be split anywhere,
/// including in the middle of a JSON payload. The decoder keeps everything it
/// has not fully consumed in an internal buffer, so nothing that spans a
/// chunk boundary is lost.
///
/// Framing, per newline-terminated line (one trailing `\r` is trimmed):
/// - a line starting with `:` is a comment and is ignored
/// - a blank line is ignored
/// - a line without the `data: ` prefix is ignored
/// - a payload of `[DONE]` ends the logical stream; later bytes are ignored
/// - any other payload is a JSON object; `choices[0].delta.content` is
///   appended to the accumulated text when present
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

enum Step {
    /// A content unit completed.
    Delta(String),
    /// A line was consumed without producing content.
    Consumed,
    /// Nothing more can be decoded until the transport delivers more bytes.
    NeedMore,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated text so far. Grows monotonically.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True once the `[DONE]` sentinel was seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Appends a raw chunk and decodes every unit that is now complete.
    ///
    /// Returns the content deltas completed by this chunk, in stream order.
    /// An empty return with `is_done() == false` means the decoder is waiting
    /// for more bytes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }
        self.pending.extend_from_slice(chunk);

        let mut deltas = Vec::new();
        while !self.done {
            match self.take_unit() {
                Step::Delta(piece) => {
                    self.text.push_str(&piece);
                    deltas.push(piece);
                }
                Step::Consumed => {}
                Step::NeedMore => break,
            }
        }
        if self.done {
            self.pending.clear();
        }
        deltas
    }

    /// End of stream: a trailing fragment that never resolved into a complete
    /// line is discarded, the accumulated text is returned as-is.
    pub fn finish(self) -> String {
        self.text
    }

    fn take_unit(&mut self) -> Step {
        let newline = match find_newline(&self.pending, 0) {
            Some(index) => index,
            None => return Step::NeedMore,
        };
        let line = trim_cr(&self.pending[..newline]);

        if line.is_empty() || line[0] == b':' {
            self.pending.drain(..=newline);
            return Step::Consumed;
        }
        if !line.starts_with(DATA_PREFIX) {
            self.pending.drain(..=newline);
            return Step::Consumed;
        }

        let payload = String::from_utf8_lossy(&line[DATA_PREFIX.len()..]);
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            self.done = true;
            self.pending.drain(..=newline);
            return Step::Consumed;
        }
        if payload.is_empty() {
            self.pending.drain(..=newline);
            return Step::Consumed;
        }

        // A payload that fails to parse may be a JSON object whose interior
        // whitespace contained the line break, split across chunks. The line
        // is not consumed; instead the candidate payload is extended across
        // each newline already buffered. If no extension parses, the bytes
        // stay in place until the transport delivers the rest.
        let mut end = newline;
        loop {
            let candidate = trim_cr(&self.pending[DATA_PREFIX.len()..end]);
            if let Ok(value) = serde_json::from_slice::<Value>(candidate) {
                let piece = extract_content(&value);
                self.pending.drain(..=end);
                return match piece {
                    Some(piece) => Step::Delta(piece),
                    None => Step::Consumed,
                };
            }
            end = match find_newline(&self.pending, end + 1) {
                Some(index) => index,
                None => return Step::NeedMore,
            };
        }
    }
}

fn find_newline(buffer: &[u8], from: usize) -> Option<usize> {
    buffer[from..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map(|index| index + from)
}

fn trim_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

fn extract_content(value: &Value) -> Option<String> {
    value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|content| content.as_str())
        .map(|content| content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_line(piece: &str) -> String {
        format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":\"{}\"}}}}]}}\n",
            piece
        )
    }

    #[test]
    fn test_round_trip_across_two_chunks() {
        let mut decoder = StreamDecoder::new();

        let deltas = decoder.feed(content_line("Hel").as_bytes());
        assert_eq!(deltas, vec!["Hel".to_string()]);
        assert_eq!(decoder.text(), "Hel");

        let deltas = decoder.feed(content_line("lo").as_bytes());
        assert_eq!(deltas, vec!["lo".to_string()]);
        assert_eq!(decoder.text(), "Hello");
    }

    #[test]
    fn test_line_split_mid_json_is_reassembled() {
        let mut decoder = StreamDecoder::new();

        let deltas = decoder.feed(b"data: {\"choices\":[{\"delta\":");
        assert!(deltas.is_empty());
        assert_eq!(decoder.text(), "");

        let deltas = decoder.feed(b"{\"content\":\"X\"}}]}\n");
        assert_eq!(deltas, vec!["X".to_string()]);
        assert_eq!(decoder.text(), "X");
    }

    #[test]
    fn test_json_with_embedded_newline_is_reassembled() {
        let mut decoder = StreamDecoder::new();

        // The object's inter-token whitespace contains the line break, so the
        // first extracted line is not valid JSON on its own
        let deltas = decoder.feed(b"data: {\"choices\":\n");
        assert!(deltas.is_empty());

        let deltas = decoder.feed(b"[{\"delta\":{\"content\":\"Y\"}}]}\n");
        assert_eq!(deltas, vec!["Y".to_string()]);
        assert_eq!(decoder.text(), "Y");
    }

    #[test]
    fn test_done_sentinel_stops_extraction() {
        let mut decoder = StreamDecoder::new();

        decoder.feed(content_line("antes").as_bytes());
        decoder.feed(b"data: [DONE]\n");
        assert!(decoder.is_done());

        let deltas = decoder.feed(content_line("depois").as_bytes());
        assert!(deltas.is_empty());
        assert_eq!(decoder.finish(), "antes");
    }

    #[test]
    fn test_done_sentinel_in_same_chunk_as_content() {
        let mut decoder = StreamDecoder::new();
        let chunk = format!(
            "{}data: [DONE]\n{}",
            content_line("só isso"),
            content_line("ignorado")
        );
        let deltas = decoder.feed(chunk.as_bytes());
        assert_eq!(deltas, vec!["só isso".to_string()]);
        assert!(decoder.is_done());
        assert_eq!(decoder.finish(), "só isso");
    }

    #[test]
    fn test_comments_blanks_and_foreign_lines_are_ignored() {
        let mut decoder = StreamDecoder::new();
        let chunk = format!(
            ": keep-alive\n\nevent: message\n{}",
            content_line("ok")
        );
        let deltas = decoder.feed(chunk.as_bytes());
        assert_eq!(deltas, vec!["ok".to_string()]);
        assert_eq!(decoder.text(), "ok");
    }

    #[test]
    fn test_crlf_lines_are_handled() {
        let mut decoder = StreamDecoder::new();
        let deltas =
            decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"ab\"}}]}\r\n");
        assert_eq!(deltas, vec!["ab".to_string()]);
    }

    #[test]
    fn test_delta_without_content_is_skipped() {
        let mut decoder = StreamDecoder::new();
        let chunk = format!(
            "data: {{\"choices\":[{{\"delta\":{{}}}}]}}\n{}",
            content_line("fim")
        );
        let deltas = decoder.feed(chunk.as_bytes());
        assert_eq!(deltas, vec!["fim".to_string()]);
        assert_eq!(decoder.text(), "fim");
    }

    #[test]
    fn test_trailing_fragment_is_dropped_on_finish() {
        let mut decoder = StreamDecoder::new();
        decoder.feed(content_line("parcial").as_bytes());
        decoder.feed(b"data: {\"choices\":[{\"delta\":");
        assert_eq!(decoder.finish(), "parcial");
    }

    #[test]
    fn test_single_chunk_with_many_lines() {
        let mut decoder = StreamDecoder::new();
        let chunk = format!("{}{}{}", content_line("a"), content_line("b"), content_line("c"));
        let deltas = decoder.feed(chunk.as_bytes());
        assert_eq!(deltas, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(decoder.text(), "abc");
    }

    #[test]
    fn test_byte_by_byte_delivery() {
        let mut decoder = StreamDecoder::new();
        let line = content_line("devagar");
        let mut all = Vec::new();
        for byte in line.as_bytes() {
            all.extend(decoder.feed(&[*byte]));
        }
        assert_eq!(all, vec!["devagar".to_string()]);
        assert_eq!(decoder.text(), "devagar");
    }
}
