//! Claude stream vocabulary.
//!
//! Accepts Anthropic Messages streaming events (`message_start`,
//! `content_block_*`, `message_delta`, `message_stop`), optionally wrapped by
//! the CLI's `stream_event` envelope, plus the CLI's terminal `result` frame.

mod decoder;
mod types;

pub use decoder::ClaudeDecoder;
pub use types::ClaudeUsage;
