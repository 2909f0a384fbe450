//! Incremental SSE decoder
//!
//! Accepts the response body in arbitrary chunks and yields the `data` of each
//! complete event. Multiple `data:` lines in one event are joined with `\n`.
//! Comments (keep-alives) and other fields are ignored.

/// Server-Sent-Events decoder state
#[derive(Debug, Default)]
pub struct SseDecoder {
    partial: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the data of every event it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.partial.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]);
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if let Some(event) = self.line(line) {
                events.push(event);
            }
        }
        events
    }

    fn line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let event = self.data.join("\n");
            self.data.clear();
            return Some(event);
        }

        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();

        assert_eq!(decoder.push(b"data: hello\n\n"), vec!["hello"]);
    }

    #[test]
    fn test_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b"da").is_empty());
        assert!(decoder.push(b"ta: {\"a\":").is_empty());
        assert!(decoder.push(b" 1}\n").is_empty());
        assert_eq!(decoder.push(b"\n"), vec![r#"{"a": 1}"#]);
    }

    #[test]
    fn test_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::new();

        let events = decoder.push(b"data: a\n\ndata: b\n\ndata: c");
        assert_eq!(events, vec!["a", "b"]);
        assert_eq!(decoder.push(b"\n\n"), vec!["c"]);
    }

    #[test]
    fn test_comments_and_other_fields_ignored() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.push(b":\n\n").is_empty());
        assert!(decoder.push(b": keep-alive\n\n").is_empty());
        assert_eq!(
            decoder.push(b"event: message\nid: 7\ndata: x\n\n"),
            vec!["x"]
        );
    }

    #[test]
    fn test_crlf_and_multiline_data() {
        let mut decoder = SseDecoder::new();

        assert_eq!(
            decoder.push(b"data: one\r\ndata:two\r\n\r\n"),
            vec!["one\ntwo"]
        );
    }

    #[test]
    fn test_utf8_split_inside_character() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: é\n\n".as_bytes();

        assert!(decoder.push(&bytes[..7]).is_empty());
        assert_eq!(decoder.push(&bytes[7..]), vec!["é"]);
    }
}
