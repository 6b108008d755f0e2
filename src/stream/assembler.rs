//! Incremental assembly of a streamed text reply.

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use super::session::StreamSession;
use crate::error::Result;
use crate::io::Utf8StreamDecoder;

/// Turns a chunked byte stream into a growing text snapshot.
///
/// # Examples
///
/// ```
/// use marketpulse::stream::ResponseAssembler;
///
/// let mut assembler = ResponseAssembler::new();
/// assert_eq!(assembler.feed(b"Hello, "), Some("Hello, "));
/// assert_eq!(assembler.feed(b"world"), Some("Hello, world"));
/// assert_eq!(assembler.finish(), "Hello, world");
/// ```
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    decoder: Utf8StreamDecoder,
    session: StreamSession,
}

impl ResponseAssembler {
    /// Creates an assembler with a fresh session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decoder: Utf8StreamDecoder::new(),
            session: StreamSession::new(),
        }
    }

    /// Feeds one chunk and returns the full snapshot.
    ///
    /// Returns `None` for empty chunks and for chunks that arrive after the
    /// session completed or failed.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<&str> {
        if chunk.is_empty() || !self.session.is_live() {
            return None;
        }
        let decoded = self.decoder.decode(chunk);
        self.session.append(&decoded);
        Some(self.session.text())
    }

    /// Ends the stream, flushing any dangling bytes, and returns the final text.
    pub fn finish(&mut self) -> &str {
        if self.session.is_live() {
            let tail = self.decoder.finish();
            if !tail.is_empty() {
                self.session.append(&tail);
            }
            self.session.complete();
        }
        self.session.text()
    }

    /// Aborts the stream, discarding the partial text.
    pub fn fail(&mut self) {
        self.decoder = Utf8StreamDecoder::new();
        self.session.fail();
    }

    /// Returns the current session state.
    #[must_use]
    pub const fn session(&self) -> &StreamSession {
        &self.session
    }

    /// Drains `stream`, calling `on_snapshot` with the full text after every
    /// non-empty chunk.
    ///
    /// Returns the final text when the stream ends. On the first stream error
    /// the partial text is discarded, nothing further is read, and the error
    /// is returned.
    pub async fn consume<S, B, F>(mut self, mut stream: S, mut on_snapshot: F) -> Result<String>
    where
        S: Stream<Item = Result<B>> + Unpin,
        B: AsRef<[u8]>,
        F: FnMut(&str),
    {
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(snapshot) = self.feed(chunk.as_ref()) {
                        debug!(bytes = snapshot.len(), "stream snapshot");
                        on_snapshot(snapshot);
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        chunks = self.session.chunk_count(),
                        "stream failed; discarding partial reply"
                    );
                    self.fail();
                    return Err(e);
                }
            }
        }

        let shown = self.session.text().len();
        let text = self.finish();
        if text.len() != shown {
            on_snapshot(text);
        }
        Ok(std::mem::take(&mut self.session).into_text())
    }
}
