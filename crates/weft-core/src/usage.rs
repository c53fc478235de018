//! Provider identity and the unified token usage record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upstream agent provider whose stream vocabulary is being normalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Claude (Anthropic Messages streaming, optionally CLI-wrapped).
    #[default]
    Claude,
    /// Codex (Responses-style streaming with positional output indices).
    Codex,
}

impl ProviderKind {
    /// Wire name used in logs, settings and serialized usage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "codex" | "openai" => Ok(Self::Codex),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Token usage reported for one turn, normalized across providers.
///
/// Produced only from a real provider payload: a turn without usage carries
/// `None`, never a zeroed record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    /// Input tokens as reported by the provider.
    pub input: u64,
    /// Output tokens generated.
    pub output: u64,
    /// Input tokens served from the prompt cache, when the provider reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_input: Option<u64>,
    /// Provider the counters came from.
    pub provider: ProviderKind,
}
