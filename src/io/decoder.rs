//! Stateful UTF-8 decoding for chunked byte streams.
//!
//! Network reads split text at arbitrary byte offsets, so a multi-byte
//! character can straddle two chunks. [`Utf8StreamDecoder`] keeps the
//! incomplete tail of each chunk and prepends it to the next one.

/// Replacement character emitted for undecodable input.
pub const REPLACEMENT: char = '\u{FFFD}';

/// Incremental UTF-8 decoder.
///
/// Invalid sequences decode to U+FFFD rather than failing the stream.
///
/// # Examples
///
/// ```
/// use marketpulse::io::Utf8StreamDecoder;
///
/// let bytes = "€".as_bytes(); // 3 bytes
/// let mut decoder = Utf8StreamDecoder::new();
/// assert_eq!(decoder.decode(&bytes[..1]), "");
/// assert_eq!(decoder.decode(&bytes[1..]), "€");
/// assert_eq!(decoder.finish(), "");
/// ```
#[derive(Debug, Default, Clone)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Creates a decoder with no buffered bytes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Decodes the next chunk, holding back an incomplete trailing sequence.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(chunk);

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));

                    if let Some(bad) = err.error_len() {
                        out.push(REPLACEMENT);
                        rest = &tail[bad..];
                    } else {
                        // Truncated sequence at the end: wait for more bytes.
                        self.pending = tail.to_vec();
                        break;
                    }
                }
            }
        }

        out
    }

    /// Flushes the decoder at end of stream.
    ///
    /// A dangling partial sequence becomes a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    /// Returns the number of buffered bytes awaiting completion.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"hello "), "hello ");
        assert_eq!(decoder.decode(b"world"), "world");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_split_four_byte_char() {
        let bytes = "a😀b".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for byte in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        out.push_str(&decoder.finish());
        assert_eq!(out, "a😀b");
    }

    #[test]
    fn test_pending_tracks_partial_sequence() {
        let bytes = "世".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&bytes[..2]), "");
        assert_eq!(decoder.pending_len(), 2);
        assert_eq!(decoder.decode(&bytes[2..]), "世");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_invalid_bytes_replaced() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn test_finish_flushes_dangling_sequence() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xE4, 0xB8]), "x");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_empty_chunk() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&[]), "");
        assert_eq!(decoder.finish(), "");
    }
}
