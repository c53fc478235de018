//! Maps provider usage payloads onto the unified [`Usage`] record.

use weft_core::{ProviderKind, Usage};

use crate::claude::ClaudeUsage;
use crate::codex::CodexUsage;
use crate::types::ProviderUsage;

/// Unify a provider usage payload.
///
/// Returns `None` when the payload reports neither input nor output tokens;
/// a missing counter beside a present one is read as zero.
pub fn unify(usage: &ProviderUsage) -> Option<Usage> {
    match usage {
        ProviderUsage::Claude(u) => unify_claude(u),
        ProviderUsage::Codex(u) => unify_codex(u),
    }
}

/// Layer a later usage report over an earlier one from the same message.
///
/// Counters present in `update` win; counters it omits are taken from
/// `base`. Claude's `message_delta` carries only output tokens, so the input
/// and cache counters come from `message_start`.
pub fn merge(base: Option<&ProviderUsage>, update: &ProviderUsage) -> ProviderUsage {
    match (base, update) {
        (Some(ProviderUsage::Claude(b)), ProviderUsage::Claude(u)) => {
            ProviderUsage::Claude(ClaudeUsage {
                input_tokens: u.input_tokens.or(b.input_tokens),
                output_tokens: u.output_tokens.or(b.output_tokens),
                cache_read_input_tokens: u.cache_read_input_tokens.or(b.cache_read_input_tokens),
                cache_creation_input_tokens: u
                    .cache_creation_input_tokens
                    .or(b.cache_creation_input_tokens),
            })
        }
        (Some(ProviderUsage::Codex(b)), ProviderUsage::Codex(u)) => {
            ProviderUsage::Codex(CodexUsage {
                input_tokens: u.input_tokens.or(b.input_tokens),
                output_tokens: u.output_tokens.or(b.output_tokens),
                input_tokens_details: u
                    .input_tokens_details
                    .clone()
                    .or_else(|| b.input_tokens_details.clone()),
                cached_input_tokens: u.cached_input_tokens.or(b.cached_input_tokens),
            })
        }
        _ => update.clone(),
    }
}

/// Whether the payload reports input tokens.
pub fn has_input(usage: &ProviderUsage) -> bool {
    match usage {
        ProviderUsage::Claude(u) => u.input_tokens.is_some(),
        ProviderUsage::Codex(u) => u.input_tokens.is_some(),
    }
}

fn unify_claude(u: &ClaudeUsage) -> Option<Usage> {
    if u.input_tokens.is_none() && u.output_tokens.is_none() {
        return None;
    }
    Some(Usage {
        input: u.input_tokens.unwrap_or(0),
        output: u.output_tokens.unwrap_or(0),
        // cache read wins over cache creation
        cached_input: u.cache_read_input_tokens.or(u.cache_creation_input_tokens),
        provider: ProviderKind::Claude,
    })
}

fn unify_codex(u: &CodexUsage) -> Option<Usage> {
    if u.input_tokens.is_none() && u.output_tokens.is_none() {
        return None;
    }
    let nested = u.input_tokens_details.as_ref().and_then(|d| d.cached_tokens);
    Some(Usage {
        input: u.input_tokens.unwrap_or(0),
        output: u.output_tokens.unwrap_or(0),
        cached_input: nested.or(u.cached_input_tokens),
        provider: ProviderKind::Codex,
    })
}
