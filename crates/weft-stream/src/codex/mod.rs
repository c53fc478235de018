//! Codex stream vocabulary (Responses-style events addressed by
//! `output_index`).

mod decoder;
mod types;

pub use decoder::CodexDecoder;
pub use types::{CodexUsage, InputTokensDetails};
