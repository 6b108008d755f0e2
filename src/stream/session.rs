//! Per-submission streaming state.

/// State of one in-progress streamed reply.
///
/// Text only grows while the session is live. Once the session fails, the
/// partial text is discarded and any later chunk is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSession {
    text: String,
    chunks: usize,
    complete: bool,
    failed: bool,
}

impl StreamSession {
    /// Creates an empty, live session.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            chunks: 0,
            complete: false,
            failed: false,
        }
    }

    /// Appends decoded text from one chunk.
    ///
    /// Returns `false` (and changes nothing) if the session already
    /// completed or failed.
    pub fn append(&mut self, decoded: &str) -> bool {
        if !self.is_live() {
            return false;
        }
        self.text.push_str(decoded);
        self.chunks += 1;
        true
    }

    /// Marks the stream as ended normally.
    pub fn complete(&mut self) {
        if !self.failed {
            self.complete = true;
        }
    }

    /// Marks the stream as failed and drops the partial text.
    pub fn fail(&mut self) {
        self.failed = true;
        self.complete = false;
        self.text.clear();
    }

    /// Returns true while chunks are still accepted.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !self.complete && !self.failed
    }

    /// Returns true once the stream ended normally.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns true once the stream failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failed
    }

    /// Returns the accumulated text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns how many chunks were accepted.
    #[must_use]
    pub const fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Consumes the session, returning the accumulated text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }
}
