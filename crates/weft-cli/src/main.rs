//! # weft
//!
//! Command-line entry point. `weft replay` feeds a recorded provider stream
//! (NDJSON or SSE, from a file or stdin) through one stream session and
//! prints every projected `UiEvent` as a JSON line on stdout.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::pin::pin;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use weft_core::{ProviderKind, UiEvent};
use weft_session::{SessionRegistry, TurnOutcome};
use weft_settings::WeftSettings;
use weft_stream::json_frames;

/// Exit code for a turn the provider reported as failed.
const EXIT_TURN_FAILED: u8 = 1;
/// Exit code for a turn cancelled with Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

/// weft stream tools.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "Normalize agent provider streams into UI events")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded provider stream and print the projected UI events.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Provider whose wire format the recording uses (claude or codex).
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Session id to replay under (a fresh id is generated otherwise).
    #[arg(long)]
    session_id: Option<String>,

    /// Log level or filter directive (overrides settings).
    #[arg(long)]
    log_level: Option<String>,

    /// Recorded stream. Reads stdin when omitted or `-`.
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = weft_settings::load_settings().unwrap_or_default();

    match cli.command {
        Command::Replay(args) => replay(args, &settings).await,
    }
}

async fn replay(args: ReplayArgs, settings: &WeftSettings) -> Result<ExitCode> {
    let level = args.log_level.as_deref().unwrap_or(&settings.logging.level);
    weft_core::logging::init_subscriber(level);

    let provider = args.provider.unwrap_or(settings.stream.default_provider);
    let input = open_input(args.file.as_deref()).await?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = replay_stream(
        input,
        tokio::io::stdout(),
        provider,
        args.session_id,
        settings,
        &cancel,
    )
    .await;
    ctrl_c.abort();

    Ok(match outcome? {
        TurnOutcome::Completed => ExitCode::SUCCESS,
        TurnOutcome::Failed => ExitCode::from(EXIT_TURN_FAILED),
        TurnOutcome::Cancelled => ExitCode::from(EXIT_CANCELLED),
    })
}

async fn open_input(path: Option<&Path>) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open recording: {}", path.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(tokio::io::stdin())),
    }
}

/// Run one turn over `input`, writing UI events to `output`.
///
/// Every event is written before this returns, including the `error` event
/// of a transport failure.
async fn replay_stream<R, W>(
    input: R,
    output: W,
    provider: ProviderKind,
    session_id: Option<String>,
    settings: &WeftSettings,
    cancel: &CancellationToken,
) -> Result<TurnOutcome>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin + 'static,
{
    let registry = SessionRegistry::from_settings(settings);
    let session = match session_id {
        Some(id) => registry.create_with_id(id, provider),
        None => registry.create(provider),
    };
    info!(session_id = session.id(), %provider, "replaying recording");

    let writer = tokio::spawn(write_events(session.subscribe(), output));
    let frames = pin!(json_frames(ReaderStream::new(input)));
    let outcome = session.run_turn(frames, cancel).await;

    // closing the channel ends the writer
    drop(session);
    drop(registry);
    let written = writer.await.context("UI event writer panicked")??;
    debug!(written, "replay finished");

    Ok(outcome?)
}

/// Write each received event as one JSON line until the channel closes.
async fn write_events<W>(mut rx: broadcast::Receiver<UiEvent>, mut output: W) -> Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    loop {
        match rx.recv().await {
            Ok(event) => {
                let mut line = serde_json::to_vec(&event)?;
                line.push(b'\n');
                output.write_all(&line).await?;
                written += 1;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "UI event output lagged, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    output.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::CommandFactory;
    use serde_json::Value;
    use weft_session::SessionError;

    use super::*;

    const TEXT_TURN: &str = r#"{"type":"message_start","message":{"id":"m1","content":[]}}
{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}
{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"hi"}}
{"type":"content_block_stop","index":0}
{"type":"message_stop"}
{"type":"result","subtype":"success","is_error":false,"usage":{"input_tokens":3,"output_tokens":1}}
"#;

    fn recording(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    async fn run(contents: &str) -> (Result<TurnOutcome>, Vec<Value>) {
        let input = recording(contents);
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("events.jsonl");

        let reader = open_input(Some(input.path())).await.unwrap();
        let output = tokio::fs::File::create(&out_path).await.unwrap();
        let outcome = replay_stream(
            reader,
            output,
            ProviderKind::Claude,
            Some("replay-1".into()),
            &WeftSettings::default(),
            &CancellationToken::new(),
        )
        .await;

        let lines = std::fs::read_to_string(&out_path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (outcome, lines)
    }

    // ── argument parsing ────────────────────────────────────────────────

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_replay_args() {
        let cli = Cli::try_parse_from([
            "weft",
            "replay",
            "--provider",
            "codex",
            "--session-id",
            "s1",
            "--log-level",
            "debug",
            "rec.jsonl",
        ])
        .unwrap();
        let Command::Replay(args) = cli.command;
        assert_eq!(args.provider, Some(ProviderKind::Codex));
        assert_eq!(args.session_id.as_deref(), Some("s1"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.file, Some(PathBuf::from("rec.jsonl")));
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["weft", "replay", "--provider", "gemini"]).is_err());
    }

    // ── replay ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn replays_text_turn() {
        let (outcome, events) = run(TEXT_TURN).await;
        assert_eq!(outcome.unwrap(), TurnOutcome::Completed);

        let types: Vec<_> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(types, ["message_start", "text_start", "text_delta", "message_complete"]);
        assert_eq!(events[0]["sessionId"], "replay-1");
        assert_eq!(events[3]["usage"]["input"], 3);
    }

    #[tokio::test]
    async fn truncated_recording_is_transport_failure() {
        let truncated: String = TEXT_TURN.lines().take(3).collect::<Vec<_>>().join("\n");
        let (outcome, events) = run(&truncated).await;

        let err = outcome.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::Transport { .. })
        ));
        assert_eq!(events.last().unwrap()["type"], "error");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_input(Some(&dir.path().join("nope.jsonl"))).await.err().unwrap();
        assert!(err.to_string().contains("Failed to open recording"));
    }
}
