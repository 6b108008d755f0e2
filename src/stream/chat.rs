//! Conversation driver for the streaming assistant.
//!
//! A [`ChatSession`] owns the message history and allows at most one
//! streamed reply in flight. A turn is split into [`ChatSession::begin`]
//! (append the user message, build the payload) and
//! [`ChatSession::finish`] (commit the reply or the fallback text), with
//! [`ChatSession::submit`] running both around a [`ChatBackend`].

use tracing::{info, warn};

use super::assembler::ResponseAssembler;
use super::backend::ChatBackend;
use crate::core::{ChatMessage, ChatRequest, Conversation, greeting_for};
use crate::error::Result;

/// Reply committed when a stream fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again later.";

/// Receives progress from a streamed turn.
pub trait ChatObserver {
    /// Called with the full reply text so far, after every chunk.
    fn on_snapshot(&mut self, text: &str);

    /// Called once when the turn is committed to history.
    fn on_commit(&mut self, _message: &ChatMessage) {}
}

/// A turn that has been accepted but not yet committed.
#[derive(Debug)]
#[must_use = "a pending turn must be finished or abandoned"]
pub struct PendingTurn {
    request: ChatRequest,
}

impl PendingTurn {
    /// Returns the payload to send upstream.
    pub const fn request(&self) -> &ChatRequest {
        &self.request
    }
}

/// How a submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Input was blank or another turn was still streaming.
    Rejected,
    /// The full reply was committed.
    Answered,
    /// The stream failed and the fallback reply was committed.
    Failed,
}

/// Chat history plus the in-flight guard.
#[derive(Debug, Clone)]
pub struct ChatSession {
    conversation: Conversation,
    ticker: Option<String>,
    in_flight: bool,
    in_progress: Option<String>,
}

impl ChatSession {
    /// Creates a session that opens with the default greeting.
    #[must_use]
    pub fn new(ticker: Option<String>) -> Self {
        let greeting = greeting_for(ticker.as_deref());
        Self {
            conversation: Conversation::with_greeting(greeting),
            ticker,
            in_flight: false,
            in_progress: None,
        }
    }

    /// Creates a session with no greeting.
    #[must_use]
    pub const fn without_greeting(ticker: Option<String>) -> Self {
        Self {
            conversation: Conversation::new(),
            ticker,
            in_flight: false,
            in_progress: None,
        }
    }

    /// Returns the committed history.
    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns true while a turn is streaming.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Returns the transient snapshot of the reply being streamed.
    #[must_use]
    pub fn in_progress(&self) -> Option<&str> {
        self.in_progress.as_deref()
    }

    /// Starts a turn.
    ///
    /// Returns `None` without touching history if `input` is blank or a turn
    /// is already in flight.
    pub fn begin(&mut self, input: &str) -> Option<PendingTurn> {
        if input.trim().is_empty() || self.in_flight {
            return None;
        }

        self.conversation.push(ChatMessage::user(input));
        self.in_flight = true;
        self.in_progress = Some(String::new());

        Some(PendingTurn {
            request: ChatRequest {
                message: input.to_string(),
                ticker: self.ticker.clone(),
                history: self.conversation.outbound_history().to_vec(),
            },
        })
    }

    /// Commits a turn's result to history.
    ///
    /// A successful reply is committed verbatim, even if empty. A failure
    /// commits [`FALLBACK_REPLY`] instead of any partial text.
    pub fn finish(&mut self, _turn: PendingTurn, outcome: Result<String>) -> ChatMessage {
        let message = match outcome {
            Ok(text) => ChatMessage::assistant(text),
            Err(e) => {
                warn!(error = %e, "chat turn failed");
                ChatMessage::assistant(FALLBACK_REPLY)
            }
        };
        self.in_flight = false;
        self.in_progress = None;
        self.conversation.push(message.clone());
        message
    }

    /// Drops a turn without committing a reply.
    pub fn abandon(&mut self, _turn: PendingTurn) {
        self.in_flight = false;
        self.in_progress = None;
    }

    /// Runs a whole turn against `backend`.
    pub async fn submit<B, O>(&mut self, backend: &B, input: &str, observer: &mut O) -> Submission
    where
        B: ChatBackend + ?Sized,
        O: ChatObserver + Send,
    {
        let Some(turn) = self.begin(input) else {
            return Submission::Rejected;
        };

        let in_progress = &mut self.in_progress;
        let outcome = match backend.open_stream(turn.request()).await {
            Ok(stream) => {
                ResponseAssembler::new()
                    .consume(stream, |text| {
                        *in_progress = Some(text.to_string());
                        observer.on_snapshot(text);
                    })
                    .await
            }
            Err(e) => Err(e),
        };

        let submission = if outcome.is_ok() {
            Submission::Answered
        } else {
            Submission::Failed
        };
        let committed = self.finish(turn, outcome);
        info!(chars = committed.content.len(), ?submission, "chat turn committed");
        observer.on_commit(&committed);
        submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::error::StreamError;

    #[test]
    fn test_begin_builds_payload_without_greeting() {
        let mut session = ChatSession::new(Some("AAPL".to_string()));
        let turn = session.begin("How's Apple?").unwrap();

        let request = turn.request();
        assert_eq!(request.message, "How's Apple?");
        assert_eq!(request.ticker.as_deref(), Some("AAPL"));
        assert_eq!(request.history, vec![ChatMessage::user("How's Apple?")]);
        session.abandon(turn);
    }

    #[test]
    fn test_begin_rejects_while_in_flight() {
        let mut session = ChatSession::new(None);
        let turn = session.begin("first").unwrap();
        assert!(session.begin("second").is_none());
        assert_eq!(session.conversation().len(), 2);

        session.finish(turn, Ok("answer".to_string()));
        assert!(!session.is_in_flight());
        assert!(session.begin("second").is_some());
    }

    #[test]
    fn test_begin_rejects_blank_input() {
        let mut session = ChatSession::new(None);
        assert!(session.begin("   ").is_none());
        assert_eq!(session.conversation().len(), 1);
    }

    #[test]
    fn test_finish_failure_commits_fallback() {
        let mut session = ChatSession::without_greeting(None);
        let turn = session.begin("q").unwrap();
        let committed = session.finish(turn, Err(StreamError::Read("reset".into()).into()));
        assert_eq!(committed.role, Role::Assistant);
        assert_eq!(committed.content, FALLBACK_REPLY);
        assert_eq!(session.conversation().last(), Some(&committed));
        assert!(session.in_progress().is_none());
    }

    #[test]
    fn test_abandon_commits_nothing() {
        let mut session = ChatSession::without_greeting(None);
        let turn = session.begin("q").unwrap();
        session.abandon(turn);
        assert_eq!(session.conversation().len(), 1);
        assert!(!session.is_in_flight());
    }
}
