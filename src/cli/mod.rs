//! CLI layer for marketpulse.
//!
//! Provides the command-line interface using clap, with one-shot commands
//! for each dashboard view plus the polling `watch`, the streaming `chat`,
//! and the normalizing `gateway`.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, View};
