//! Per-session stream normalizer.
//!
//! Drives the message state machine over decoded [`ProviderFrame`]s and
//! emits provider-agnostic [`NormalizedEvent`]s:
//!
//! ```text
//! Idle -> MessageOpen -> (ContentOpen)* -> MessageClosing -> Idle
//! ```
//!
//! Protocol inconsistencies (content outside a message, deltas or stops for
//! indices that are not open, duplicate starts) are dropped with a debug log.
//! A message start without an id fails that message only.

use tracing::{debug, info, warn};
use weft_core::{BlockHeader, BlockKind, DeltaPayload, NormalizedEvent, ProviderKind};

use crate::accumulator::BlockAccumulator;
use crate::types::{ProviderFrame, ProviderUsage, RawDelta, RawProviderEvent};
use crate::usage::{has_input, merge, unify};

/// Where the normalizer is in the current message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No message in flight.
    Idle,
    /// A message started and no block is open.
    MessageOpen,
    /// At least one block is open.
    ContentOpen,
    /// The message stopped; waiting for the next message or the turn result.
    MessageClosing,
}

/// Converts one session's decoded frames into [`NormalizedEvent`]s.
#[derive(Debug)]
pub struct StreamNormalizer {
    session_id: String,
    provider: ProviderKind,
    phase: Phase,
    accumulator: BlockAccumulator,
    /// Usage reported by the current message's start.
    message_usage: Option<ProviderUsage>,
}

impl StreamNormalizer {
    /// Create an idle normalizer for a session.
    pub fn new(session_id: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            session_id: session_id.into(),
            provider,
            phase: Phase::Idle,
            accumulator: BlockAccumulator::for_provider(provider),
            message_usage: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Session this normalizer belongs to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Provider whose frames are being normalized.
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Open block state of the current message.
    pub fn accumulator(&self) -> &BlockAccumulator {
        &self.accumulator
    }

    /// Process one frame and return the events it produces.
    pub fn process(&mut self, frame: ProviderFrame) -> Vec<NormalizedEvent> {
        let ProviderFrame {
            event,
            parent_tool_use_id: parent,
            ..
        } = frame;

        match event {
            RawProviderEvent::MessageStart {
                message_id,
                initial_blocks,
                usage,
            } => self.message_start(message_id, initial_blocks, usage, parent.as_deref()),
            RawProviderEvent::ContentBlockStart { index, header } => {
                if !self.in_message() {
                    self.drop_outside_message("content_block_start", index);
                    return vec![];
                }
                self.open_block(index, header, parent.as_deref())
            }
            RawProviderEvent::ContentBlockDelta { index, delta } => {
                self.block_delta(index, delta, parent)
            }
            RawProviderEvent::ContentBlockStop { index } => self.block_stop(index, parent),
            RawProviderEvent::MessageDelta { usage } => self.message_delta(usage.as_ref()),
            RawProviderEvent::MessageStop => {
                if self.phase == Phase::Idle {
                    debug!(session_id = %self.session_id, "message stop outside a message, dropping");
                } else {
                    self.phase = Phase::MessageClosing;
                }
                vec![]
            }
            RawProviderEvent::TurnResult {
                is_error,
                summary,
                usage,
            } => self.turn_result(is_error, summary, usage.as_ref()),
        }
    }

    /// Abandon the in-flight message without finalizing its blocks.
    ///
    /// Emits nothing; the caller reports the cancellation. Returns how many
    /// open blocks were discarded.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.accumulator.discard();
        self.accumulator.reset();
        self.message_usage = None;
        self.phase = Phase::Idle;
        debug!(session_id = %self.session_id, dropped, "normalizer cancelled");
        dropped
    }

    fn in_message(&self) -> bool {
        matches!(self.phase, Phase::MessageOpen | Phase::ContentOpen)
    }

    fn drop_outside_message(&self, event_type: &str, index: usize) {
        debug!(
            session_id = %self.session_id,
            event_type,
            index,
            phase = ?self.phase,
            "content event outside an open message, dropping"
        );
    }

    fn message_start(
        &mut self,
        message_id: Option<String>,
        initial_blocks: Vec<(usize, BlockHeader)>,
        usage: Option<ProviderUsage>,
        parent: Option<&str>,
    ) -> Vec<NormalizedEvent> {
        let Some(message_id) = message_id.filter(|id| !id.trim().is_empty()) else {
            self.accumulator.reset();
            self.message_usage = None;
            self.phase = Phase::Idle;
            warn!(
                session_id = %self.session_id,
                provider = %self.provider,
                "message start without a message id, failing message"
            );
            return vec![NormalizedEvent::TurnFailed {
                error: "message start is missing a message id".into(),
            }];
        };

        if !self.accumulator.is_empty() {
            debug!(
                session_id = %self.session_id,
                open = self.accumulator.len(),
                "new message while blocks still open, discarding them"
            );
        }
        self.accumulator.begin(&message_id);
        self.message_usage = usage;
        self.phase = Phase::MessageOpen;
        debug!(session_id = %self.session_id, %message_id, "message started");

        let headers: Vec<BlockHeader> = initial_blocks.iter().map(|(_, h)| h.clone()).collect();
        let mut events = vec![NormalizedEvent::MessageStarted {
            message_id,
            session_id: self.session_id.clone(),
            initial_content: (!headers.is_empty()).then_some(headers),
        }];
        for (index, header) in initial_blocks {
            events.extend(self.open_block(index, header, parent));
        }
        events
    }

    fn open_block(
        &mut self,
        index: usize,
        header: BlockHeader,
        parent: Option<&str>,
    ) -> Vec<NormalizedEvent> {
        if self.accumulator.is_open(index) {
            debug!(session_id = %self.session_id, index, "block already open, ignoring start");
            return vec![];
        }

        let state = self.accumulator.open(index, header);
        let id = state.stable_id.clone();
        let header = state.header.clone();
        self.phase = Phase::ContentOpen;

        let initial = header.initial_text().map(|text| match header.kind() {
            BlockKind::Thinking => DeltaPayload::ThinkingDelta(text.to_owned()),
            _ => DeltaPayload::TextDelta(text.to_owned()),
        });

        let mut events = vec![NormalizedEvent::ContentStarted {
            id: id.clone(),
            content_type: header.kind(),
            tool_name: header.tool_name().map(str::to_owned),
            parent_tool_use_id: parent.map(str::to_owned),
            index,
            header,
        }];
        if let Some(payload) = initial {
            events.push(NormalizedEvent::ContentDelta {
                id,
                index,
                payload,
                parent_tool_use_id: parent.map(str::to_owned),
            });
        }
        events
    }

    fn block_delta(
        &mut self,
        index: usize,
        delta: RawDelta,
        parent: Option<String>,
    ) -> Vec<NormalizedEvent> {
        if !self.in_message() {
            self.drop_outside_message("content_block_delta", index);
            return vec![];
        }

        let payload = match delta {
            RawDelta::Text(text) => DeltaPayload::TextDelta(text),
            RawDelta::Thinking(text) => DeltaPayload::ThinkingDelta(text),
            RawDelta::ToolArgs(text) => DeltaPayload::ToolArgFragment(text),
            RawDelta::CommandOutput(text) => DeltaPayload::CommandOutputFragment(text),
            RawDelta::Signature(signature) => {
                if !self.accumulator.append_signature(index, &signature) {
                    debug!(
                        session_id = %self.session_id,
                        index,
                        "signature for an unknown or non-thinking block, dropping"
                    );
                }
                return vec![];
            }
            RawDelta::Unrecognized(delta_type) => {
                debug!(session_id = %self.session_id, index, %delta_type, "unrecognized delta, dropping");
                return vec![];
            }
        };

        let Some(state) = self.accumulator.append(index, payload.text()) else {
            debug!(session_id = %self.session_id, index, "delta for a block that is not open, dropping");
            return vec![];
        };

        vec![NormalizedEvent::ContentDelta {
            id: state.stable_id.clone(),
            index,
            payload,
            parent_tool_use_id: parent,
        }]
    }

    fn block_stop(&mut self, index: usize, parent: Option<String>) -> Vec<NormalizedEvent> {
        if !self.in_message() {
            self.drop_outside_message("content_block_stop", index);
            return vec![];
        }

        let Some(state) = self.accumulator.close(index) else {
            debug!(session_id = %self.session_id, index, "stop for a block that is not open, dropping");
            return vec![];
        };

        let id = state.stable_id.clone();
        let content = self.accumulator.finalize(state);
        if self.accumulator.is_empty() {
            self.phase = Phase::MessageOpen;
        }

        vec![NormalizedEvent::ContentCompleted {
            id,
            index,
            content,
            parent_tool_use_id: parent,
        }]
    }

    fn message_delta(&self, usage: Option<&ProviderUsage>) -> Vec<NormalizedEvent> {
        if self.phase == Phase::Idle {
            debug!(session_id = %self.session_id, "message delta outside a message, dropping");
            return vec![];
        }
        let Some(usage) = usage else {
            return vec![];
        };
        let usage = merge(self.message_usage.as_ref(), usage);
        if !has_input(&usage) {
            debug!(
                session_id = %self.session_id,
                "message delta usage has no input tokens, leaving usage to the turn result"
            );
            return vec![];
        }
        match unify(&usage) {
            Some(usage) => vec![NormalizedEvent::TurnCompleted { usage: Some(usage) }],
            None => {
                debug!(session_id = %self.session_id, "message delta usage has no token counters");
                vec![]
            }
        }
    }

    fn turn_result(
        &mut self,
        is_error: bool,
        summary: Option<String>,
        usage: Option<&ProviderUsage>,
    ) -> Vec<NormalizedEvent> {
        let dropped = self.accumulator.discard();
        if dropped > 0 {
            debug!(session_id = %self.session_id, dropped, "turn ended with open blocks, discarding");
        }
        self.accumulator.reset();
        self.message_usage = None;
        self.phase = Phase::Idle;

        if is_error {
            let error = summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "turn failed".to_owned());
            warn!(session_id = %self.session_id, provider = %self.provider, %error, "turn failed");
            vec![NormalizedEvent::TurnFailed { error }]
        } else {
            let usage = usage.and_then(unify);
            info!(
                session_id = %self.session_id,
                provider = %self.provider,
                input_tokens = usage.as_ref().map(|u| u.input),
                output_tokens = usage.as_ref().map(|u| u.output),
                "turn completed"
            );
            vec![NormalizedEvent::TurnCompleted { usage }]
        }
    }
}
