//! Provider decoder seam.

use serde_json::Value;
use tracing::{debug, warn};
use weft_core::ProviderKind;

use crate::claude::ClaudeDecoder;
use crate::codex::CodexDecoder;
use crate::errors::DecodeError;
use crate::types::ProviderFrame;

/// Parses one provider's untrusted JSON into the shared event shape.
///
/// Implementations never panic on input; every failure is a [`DecodeError`].
pub trait ProviderDecoder: Send + Sync {
    /// Provider this decoder understands.
    fn provider(&self) -> ProviderKind;

    /// Decode one raw value.
    fn decode(&self, raw: &Value) -> Result<ProviderFrame, DecodeError>;
}

/// Decoder for a provider.
pub fn decoder_for(kind: ProviderKind) -> Box<dyn ProviderDecoder> {
    match kind {
        ProviderKind::Claude => Box::new(ClaudeDecoder),
        ProviderKind::Codex => Box::new(CodexDecoder),
    }
}

/// Decode a value, logging and swallowing any failure.
pub fn decode_or_log(decoder: &dyn ProviderDecoder, raw: &Value) -> Option<ProviderFrame> {
    match decoder.decode(raw) {
        Ok(frame) => Some(frame),
        Err(error) if error.is_unknown() => {
            debug!(provider = %decoder.provider(), %error, "dropping unrecognized provider event");
            None
        }
        Err(error) => {
            warn!(provider = %decoder.provider(), %error, "dropping undecodable provider event");
            None
        }
    }
}

/// Discriminator of a raw event object.
pub(crate) fn event_type(raw: &Value) -> Result<&str, DecodeError> {
    let obj = raw.as_object().ok_or(DecodeError::NotAnObject)?;
    obj.get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tracing::Level;
    use weft_core::logging::capture_logs;

    use super::*;

    #[test]
    fn decoder_for_matches_provider() {
        assert_eq!(decoder_for(ProviderKind::Claude).provider(), ProviderKind::Claude);
        assert_eq!(decoder_for(ProviderKind::Codex).provider(), ProviderKind::Codex);
    }

    #[test]
    fn event_type_requires_object_and_string_tag() {
        assert_eq!(event_type(&json!([1])), Err(DecodeError::NotAnObject));
        assert_eq!(event_type(&json!({"type": 3})), Err(DecodeError::MissingType));
        assert_eq!(event_type(&json!({"type": "ping"})), Ok("ping"));
    }

    #[test]
    fn unknown_kinds_log_at_debug() {
        let (logs, _guard) = capture_logs();
        let decoder = decoder_for(ProviderKind::Claude);
        assert!(decode_or_log(decoder.as_ref(), &json!({"type": "ping"})).is_none());
        assert!(logs.has_event(Level::DEBUG, "unrecognized provider event"));
        assert_eq!(logs.count_at_level(Level::WARN), 0);
    }

    #[test]
    fn malformed_payloads_log_at_warn() {
        let (logs, _guard) = capture_logs();
        let decoder = decoder_for(ProviderKind::Claude);
        let raw = json!({"type": "content_block_delta", "index": "zero"});
        assert!(decode_or_log(decoder.as_ref(), &raw).is_none());
        assert!(logs.has_event(Level::WARN, "undecodable provider event"));
    }
}
