//! Streamed chat replies.
//!
//! Consumes the assistant's chunked response body and publishes growing
//! text snapshots until the stream ends or fails.

pub mod assembler;
pub mod backend;
pub mod chat;
pub mod session;

pub use assembler::ResponseAssembler;
pub use backend::{ByteStream, ChatBackend};
pub use chat::{ChatObserver, ChatSession, FALLBACK_REPLY, PendingTurn, Submission};
pub use session::StreamSession;
