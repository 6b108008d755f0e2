//! I/O utilities for marketpulse.
//!
//! Provides incremental decoding of chunked byte streams, along with
//! Unicode helpers for rendering text.

pub mod decoder;
pub mod unicode;

pub use decoder::{REPLACEMENT, Utf8StreamDecoder};
pub use unicode::{find_char_boundary, preview, unseen_suffix};
