//! Per-session stream driver.
//!
//! A [`StreamSession`] owns one provider decoder, normalizer, projector and
//! completion gate behind a turn lock, plus the [`UiChannel`] renderers
//! subscribe to. Frames of a turn are processed strictly in arrival order by
//! a single consumer.

use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use weft_core::{NormalizedEvent, ProviderKind, UiEvent};
use weft_settings::StreamSettings;
use weft_stream::{
    ProviderDecoder, RawProviderEvent, StreamNormalizer, TransportError, decode_or_log, decoder_for,
};

use crate::channel::{DEFAULT_CAPACITY, UiChannel};
use crate::errors::{Result, SessionError};
use crate::gate::CompletionGate;
use crate::projector::{DEFAULT_PREVIEW_CHARS, UiProjector};

/// Tuning knobs for a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// UI channel capacity.
    pub channel_capacity: usize,
    /// Tool progress preview length, in characters.
    pub preview_chars: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CAPACITY,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl From<&StreamSettings> for SessionOptions {
    fn from(settings: &StreamSettings) -> Self {
        Self {
            channel_capacity: settings.channel_capacity,
            preview_chars: settings.preview_chars,
        }
    }
}

/// How a turn ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The provider reported a successful turn result.
    Completed,
    /// The provider reported a failed turn result.
    Failed,
    /// The caller cancelled the turn.
    Cancelled,
}

/// Everything a turn mutates. Guarded by the turn lock.
struct TurnPipeline {
    decoder: Box<dyn ProviderDecoder>,
    normalizer: StreamNormalizer,
    projector: UiProjector,
    gate: CompletionGate,
}

impl TurnPipeline {
    fn begin_turn(&mut self) {
        self.gate.reset();
        self.projector.reset();
    }

    fn deliver(&mut self, event: &NormalizedEvent, channel: &UiChannel) {
        let ui_events = self.projector.project(event);
        self.emit_all(ui_events, channel);
    }

    /// Close tools the provider never finished before a successful result.
    fn interrupt_open_tools(&mut self, channel: &UiChannel) {
        let ui_events = self.projector.interrupt_open_tools();
        if !ui_events.is_empty() {
            debug!(open = ui_events.len(), "turn result with tools still open, interrupting them");
        }
        self.emit_all(ui_events, channel);
    }

    fn emit_all(&mut self, ui_events: Vec<UiEvent>, channel: &UiChannel) {
        for ui_event in ui_events {
            if self.gate.admit(&ui_event) {
                let _ = channel.emit(ui_event);
            }
        }
    }
}

/// One provider conversation stream.
pub struct StreamSession {
    id: String,
    provider: ProviderKind,
    channel: UiChannel,
    pipeline: Mutex<TurnPipeline>,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("subscribers", &self.channel.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    /// Create an idle session.
    pub fn new(id: impl Into<String>, provider: ProviderKind, options: SessionOptions) -> Self {
        let id = id.into();
        Self {
            pipeline: Mutex::new(TurnPipeline {
                decoder: decoder_for(provider),
                normalizer: StreamNormalizer::new(id.clone(), provider),
                projector: UiProjector::new(options.preview_chars),
                gate: CompletionGate::new(),
            }),
            channel: UiChannel::with_capacity(options.channel_capacity),
            provider,
            id,
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Provider whose stream this session decodes.
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Subscribe to UI events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.channel.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.channel.subscriber_count()
    }

    /// Whether a turn is currently draining.
    pub fn is_busy(&self) -> bool {
        self.pipeline.try_lock().is_err()
    }

    /// Drain one turn's frames through the pipeline.
    ///
    /// Returns [`SessionError::Busy`] immediately if another turn holds the
    /// lock. The turn ends on a provider turn result, on cancellation, or on
    /// a transport failure; a stream that ends without a turn result counts
    /// as a transport failure. Either way the session is idle afterwards.
    #[tracing::instrument(skip_all, fields(session_id = %self.id, provider = %self.provider))]
    pub async fn run_turn<S>(&self, frames: S, cancel: &CancellationToken) -> Result<TurnOutcome>
    where
        S: Stream<Item = std::result::Result<Value, TransportError>> + Unpin,
    {
        let Ok(mut pipeline) = self.pipeline.try_lock() else {
            warn!("turn rejected, session busy");
            return Err(SessionError::Busy(self.id.clone()));
        };
        pipeline.begin_turn();
        info!("turn started");

        let mut frames = frames;
        loop {
            // biased: prefer cancellation when a frame and cancel are both ready
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let dropped = pipeline.normalizer.cancel();
                    pipeline.deliver(&NormalizedEvent::TurnCancelled, &self.channel);
                    pipeline.projector.reset();
                    info!(dropped, "turn cancelled");
                    return Ok(TurnOutcome::Cancelled);
                }
                next = frames.next() => next,
            };

            let raw = match next {
                Some(Ok(raw)) => raw,
                Some(Err(source)) => return Err(self.fail_transport(&mut pipeline, source)),
                None => return Err(self.fail_transport(&mut pipeline, TransportError::Closed)),
            };

            let Some(frame) = decode_or_log(pipeline.decoder.as_ref(), &raw) else {
                continue;
            };
            let outcome = match &frame.event {
                RawProviderEvent::TurnResult { is_error: true, .. } => Some(TurnOutcome::Failed),
                RawProviderEvent::TurnResult { .. } => Some(TurnOutcome::Completed),
                _ => None,
            };
            if outcome == Some(TurnOutcome::Completed) {
                pipeline.interrupt_open_tools(&self.channel);
            }

            for event in pipeline.normalizer.process(frame) {
                pipeline.deliver(&event, &self.channel);
            }

            if let Some(outcome) = outcome {
                pipeline.projector.reset();
                return Ok(outcome);
            }
        }
    }

    fn fail_transport(&self, pipeline: &mut TurnPipeline, source: TransportError) -> SessionError {
        error!(error = %source, "transport failed mid-turn");
        let _ = pipeline.normalizer.cancel();
        pipeline.deliver(
            &NormalizedEvent::TurnFailed {
                error: source.to_string(),
            },
            &self.channel,
        );
        pipeline.projector.reset();
        SessionError::Transport {
            session_id: self.id.clone(),
            source,
        }
    }
}
