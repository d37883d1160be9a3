use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use pixel_canvas::camera::Cell;
use pixel_canvas::color::Color;
use pixel_canvas::config::EngineConfig;
use pixel_canvas::engine::{Action, CanvasStatus, EngineCore};
use pixel_canvas::error::CanvasError;
use pixel_canvas::placement::ChallengeView;
use pixel_canvas::sync::{SyncClient, SyncRequest};

mod api;
mod session;

use api::Api;
use session::{ChannelTransport, Session};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

const REPLY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing session token; pass --session-token or set PIXEL_SESSION_TOKEN")]
    MissingSessionToken,
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame decode failed: {0}")]
    Decode(#[from] frames::CodecError),
    #[error("timed out waiting for websocket frame")]
    Timeout,
    #[error("server returned error for {syscall}: {message}")]
    ServerError { syscall: String, message: String },
    #[error("missing expected field `{0}`")]
    MissingField(&'static str),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error("canvas unavailable: {0}")]
    Unavailable(String),
    #[error("cell ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error("edit not sent: {0}")]
    NotPlaced(String),
    #[error("i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("png export failed: {0}")]
    Export(#[from] image::ImageError),
}

#[derive(Parser, Debug)]
#[command(name = "pixel-cli", about = "Pixel canvas snapshot and realtime CLI")]
struct Cli {
    #[arg(long, env = "PIXEL_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "PIXEL_SESSION_TOKEN")]
    session_token: Option<String>,

    /// Engine config JSON; unset keys keep their defaults.
    #[arg(long, env = "PIXEL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a canvas and print its size.
    Snapshot {
        canvas_id: String,
        /// Write the canvas as PNG.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Join a canvas and apply realtime events as they arrive.
    Watch {
        canvas_id: String,
        #[arg(long, help = "Stop after this many applied events")]
        max_events: Option<usize>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Place one pixel.
    Place {
        canvas_id: String,
        x: u32,
        y: u32,
        color: Color,
        #[arg(long, default_value_t = 15)]
        timeout_secs: u64,
    },
}

/// Monotonic milliseconds since start, the engine's time base.
struct Clock(Instant);

impl Clock {
    fn start() -> Self {
        Self(Instant::now())
    }

    fn now_ms(&self) -> f64 {
        self.0.elapsed().as_secs_f64() * 1000.0
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let api = Api::new(&cli.base_url, cli.session_token.as_deref())?;

    match cli.command {
        Command::Snapshot { canvas_id, out } => run_snapshot(&api, config, &canvas_id, out.as_deref()).await,
        Command::Watch { canvas_id, max_events, out } => {
            run_watch(&api, config, &canvas_id, max_events, out.as_deref()).await
        }
        Command::Place { canvas_id, x, y, color, timeout_secs } => {
            run_place(&api, config, &canvas_id, Cell::new(x, y), color, Duration::from_secs(timeout_secs)).await
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)?;
    let config = EngineConfig::from_json(&raw)?;
    tracing::debug!(path = %path.display(), mode = ?config.mode, "config loaded");
    Ok(config)
}

async fn run_snapshot(api: &Api, config: EngineConfig, canvas_id: &str, out: Option<&Path>) -> Result<(), CliError> {
    let core = load_core(api, config, canvas_id).await?;
    let grid = core.layers.grid();
    println!("{canvas_id}: {}x{}", grid.width, grid.height);
    export(&core, out)
}

async fn run_watch(
    api: &Api,
    config: EngineConfig,
    canvas_id: &str,
    max_events: Option<usize>,
    out: Option<&Path>,
) -> Result<(), CliError> {
    let clock = Clock::start();
    let mut core = load_core(api, config, canvas_id).await?;
    let (mut session, client) = join(api, canvas_id).await?;

    let mut applied = 0_usize;
    while max_events.is_none_or(|max| applied < max) {
        let frame = session.next_frame().await?;
        let Some(event) = client.receive(&frame) else {
            continue;
        };
        tracing::info!(?event, "event");
        report(&core.apply_sync_event(event, clock.now_ms()));
        applied = applied.saturating_add(1);
    }

    println!("applied {applied} events");
    export(&core, out)
}

async fn run_place(
    api: &Api,
    config: EngineConfig,
    canvas_id: &str,
    cell: Cell,
    color: Color,
    timeout: Duration,
) -> Result<(), CliError> {
    let clock = Clock::start();
    let mut core = load_core(api, config, canvas_id).await?;
    let grid = core.layers.grid();
    if !grid.contains(cell) {
        return Err(CliError::OutOfBounds { x: cell.x, y: cell.y, width: grid.width, height: grid.height });
    }
    let (mut session, mut client) = join(api, canvas_id).await?;

    core.select_cell(cell, clock.now_ms());
    core.set_palette_color(color);
    let mut actions = core.request_confirm(clock.now_ms());
    report(&actions);

    if let Some(view) = opened_challenge(&actions) {
        let choice = ask(&view, &mut io::stdin().lock())?;
        actions = core.answer_challenge(choice, clock.now_ms());
        report(&actions);
    }

    let Some(request) = actions.into_iter().find_map(|a| match a {
        Action::Submit(request) => Some(request),
        _ => None,
    }) else {
        return Err(CliError::NotPlaced(describe_block(&core, clock.now_ms())));
    };
    let request_id = client.submit(&request).ok_or(CliError::WsClosed)?;

    let reply = session
        .wait_for_reply(&request_id, timeout, |frame| {
            if let Some(event) = client.receive(frame) {
                report(&core.apply_sync_event(event, clock.now_ms()));
            }
        })
        .await?;
    if let Some(event) = client.receive(&reply) {
        report(&core.apply_sync_event(event, clock.now_ms()));
    }
    session::ensure_ok(reply)?;

    let placed = matches!(request, SyncRequest::SubmitEdit { .. } | SyncRequest::SubmitChallengeResult { success: true, .. });
    let cooldown = core.cooldown(clock.now_ms());
    if placed {
        println!("placed {color} at ({}, {}); cooldown {}s", cell.x, cell.y, cooldown.remaining_seconds);
    } else {
        println!("challenge failed; cooldown {}s", cooldown.remaining_seconds);
    }
    Ok(())
}

async fn load_core(api: &Api, config: EngineConfig, canvas_id: &str) -> Result<EngineCore, CliError> {
    let snapshot = api.snapshot(canvas_id).await?;
    let mut core = EngineCore::new(config, rand::random());
    core.load_snapshot(&snapshot);
    match core.status() {
        CanvasStatus::Ready => Ok(core),
        CanvasStatus::Unavailable(reason) => Err(CliError::Unavailable(reason.clone())),
        CanvasStatus::Loading => Err(CliError::Unavailable("snapshot not loaded".to_owned())),
    }
}

async fn join(api: &Api, canvas_id: &str) -> Result<(Session, SyncClient<ChannelTransport>), CliError> {
    let ticket = api.ws_ticket().await?;
    let (mut session, transport) = Session::connect(&api::ws_url(api.base_url(), &ticket)?).await?;
    let mut client = SyncClient::new(canvas_id, transport);

    let join_id = client.submit(&SyncRequest::Join).ok_or(CliError::WsClosed)?;
    let reply = session.wait_for_reply(&join_id, REPLY_TIMEOUT, |_| {}).await?;
    session::ensure_ok(reply)?;
    tracing::info!(canvas_id, "joined");
    Ok((session, client))
}

fn opened_challenge(actions: &[Action]) -> Option<ChallengeView> {
    actions.iter().find_map(|a| match a {
        Action::ChallengeOpened(view) => Some(view.clone()),
        _ => None,
    })
}

/// Print the challenge and read a 1-based choice.
fn ask(view: &ChallengeView, input: &mut impl BufRead) -> Result<usize, CliError> {
    println!("{} ({:.0}s)", view.prompt, view.remaining_ms / 1000.0);
    for (i, choice) in view.choices.iter().enumerate() {
        println!("  {}) {choice}", i + 1);
    }
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(parse_choice(&line, view.choices.len()))
}

/// Unparseable or out-of-range input counts as a wrong answer.
fn parse_choice(line: &str, choices: usize) -> usize {
    match line.trim().parse::<usize>() {
        Ok(n) if (1..=choices).contains(&n) => n - 1,
        _ => usize::MAX,
    }
}

fn describe_block(core: &EngineCore, now_ms: f64) -> String {
    let cooldown = core.cooldown(now_ms);
    if cooldown.active {
        return format!("cooling down for {}s", cooldown.remaining_seconds);
    }
    if core.placement.is_eliminated() {
        return "eliminated".to_owned();
    }
    "nothing to submit".to_owned()
}

fn report(actions: &[Action]) {
    for action in actions {
        match action {
            Action::Notice(notice) => tracing::info!(%notice, "notice"),
            Action::CooldownChanged(state) => {
                tracing::info!(active = state.active, remaining_seconds = state.remaining_seconds, "cooldown");
            }
            Action::StatusChanged(status) => tracing::info!(?status, "canvas status"),
            other => tracing::trace!(?other, "action"),
        }
    }
}

fn export(core: &EngineCore, out: Option<&Path>) -> Result<(), CliError> {
    let Some(path) = out else {
        return Ok(());
    };
    core.layers.bitmap.to_image().save(path)?;
    println!("wrote {}", path.display());
    Ok(())
}
