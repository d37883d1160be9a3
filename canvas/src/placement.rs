//! Pixel placement protocol.
//!
//! ```text
//! Idle ─select─▶ Selected ─confirm─▶ (Challenge ─answer─▶) commit ─▶ Cooldown ─expire─▶ Idle
//! ```
//!
//! A commit writes the colour into the bitmap first and only then emits the
//! network request; the preview pixel is shown alongside for a short window
//! and cleared on its own timer. There is no rollback: a server rejection is
//! surfaced as a notice and the optimistic pixel stays.
//!
//! Remote pixel events are applied whatever the local state is. The cooldown
//! only gates local confirmation.
//!
//! Timers (cooldown, challenge deadline, preview expiry) are absolute
//! deadlines on the caller's monotonic clock, re-evaluated on every call.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::camera::Cell;
use crate::color::Color;
use crate::config::EngineConfig;
use crate::mode::{ChallengeQuestion, Gate, ModeRules};
use crate::raster::{LayerStack, PendingSelection, PreviewPixel};
use crate::sync::SyncRequest;

/// Cooldown read-out for host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CooldownState {
    pub active: bool,
    pub remaining_seconds: u32,
}

/// Per-user cooldown as an absolute deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cooldown {
    ends_at_ms: Option<f64>,
}

impl Cooldown {
    /// Start (or restart) a cooldown of `secs` seconds.
    pub fn start(&mut self, now_ms: f64, secs: u32) {
        self.ends_at_ms = (secs > 0).then(|| now_ms + f64::from(secs) * 1000.0);
    }

    pub fn clear(&mut self) {
        self.ends_at_ms = None;
    }

    #[must_use]
    pub fn is_active(&self, now_ms: f64) -> bool {
        self.ends_at_ms.is_some_and(|end| now_ms < end)
    }

    /// Whole seconds left, rounded up.
    #[must_use]
    pub fn state(&self, now_ms: f64) -> CooldownState {
        match self.ends_at_ms {
            Some(end) if now_ms < end => CooldownState { active: true, remaining_seconds: ((end - now_ms) / 1000.0).ceil() as u32 },
            _ => CooldownState::default(),
        }
    }
}

/// The challenge currently waiting for an answer.
#[derive(Debug, Clone, PartialEq)]
struct OpenChallenge {
    question: ChallengeQuestion,
    cell: Cell,
    color: Color,
    deadline_ms: f64,
}

/// Challenge read-out for host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeView {
    pub prompt: String,
    pub choices: Vec<String>,
    pub cell: Cell,
    pub remaining_ms: f64,
}

/// Transient, non-blocking messages for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ChallengeFailed { lives_left: Option<u32> },
    ChallengeTimedOut { lives_left: Option<u32> },
    Eliminated,
    EditRejected { message: String },
    PeerRemoved { actor_name: String, cells: usize },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lives = |f: &mut fmt::Formatter<'_>, left: Option<u32>| match left {
            Some(n) => write!(f, " ({n} lives left)"),
            None => Ok(()),
        };
        match self {
            Self::ChallengeFailed { lives_left } => {
                f.write_str("Wrong answer, edit discarded")?;
                lives(f, *lives_left)
            }
            Self::ChallengeTimedOut { lives_left } => {
                f.write_str("Time's up, edit discarded")?;
                lives(f, *lives_left)
            }
            Self::Eliminated => f.write_str("You have been eliminated"),
            Self::EditRejected { message } => write!(f, "Edit rejected: {message}"),
            Self::PeerRemoved { actor_name, cells } => write!(f, "{actor_name} removed {cells} pixels"),
        }
    }
}

/// What the host must do after a protocol step.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CenterOn(Cell),
    Submit(SyncRequest),
    ChallengeOpened(ChallengeView),
    ChallengeClosed,
    CooldownChanged(CooldownState),
    Notice(Notice),
    Redraw,
}

/// Protocol state for one user on one canvas.
#[derive(Debug)]
pub struct Placement {
    rules: ModeRules,
    background: Color,
    preview_duration_ms: f64,
    flag_duration_ms: f64,
    questions: Vec<ChallengeQuestion>,
    cooldown: Cooldown,
    reported: CooldownState,
    challenge: Option<OpenChallenge>,
    lives: Option<u32>,
    rng: StdRng,
}

impl Placement {
    /// `seed` drives question choice.
    #[must_use]
    pub fn new(config: &EngineConfig, seed: u64) -> Self {
        let rules = config.rules().clone();
        Self {
            lives: rules.lives,
            rules,
            background: config.background,
            preview_duration_ms: config.preview_duration_ms,
            flag_duration_ms: config.flag_duration_ms,
            questions: config.questions.clone(),
            cooldown: Cooldown::default(),
            reported: CooldownState::default(),
            challenge: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // --- Read-outs ---

    #[must_use]
    pub fn cooldown(&self, now_ms: f64) -> CooldownState {
        self.cooldown.state(now_ms)
    }

    #[must_use]
    pub fn challenge(&self, now_ms: f64) -> Option<ChallengeView> {
        self.challenge.as_ref().map(|c| view(c, now_ms))
    }

    /// `None` when the mode does not track lives.
    #[must_use]
    pub fn lives(&self) -> Option<u32> {
        self.lives
    }

    #[must_use]
    pub fn is_eliminated(&self) -> bool {
        self.lives == Some(0)
    }

    /// Whether a timer needs per-frame attention.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.challenge.is_some()
    }

    // --- Local input ---

    /// Open the palette on `cell` with no colour chosen. Out-of-grid cells
    /// are ignored.
    pub fn select(&mut self, layers: &mut LayerStack, cell: Cell) -> Vec<Effect> {
        if self.challenge.is_some() || !layers.grid().contains(cell) {
            return Vec::new();
        }
        layers.preview.pending = Some(PendingSelection { cell, color: None });
        tracing::debug!(x = cell.x, y = cell.y, "cell selected");
        vec![Effect::CenterOn(cell), Effect::Redraw]
    }

    /// Move the pending selection one step, clamped to the grid.
    pub fn nudge(&mut self, layers: &mut LayerStack, dx: i64, dy: i64) -> Vec<Effect> {
        let grid = layers.grid();
        match layers.preview.pending.as_mut() {
            Some(pending) if self.challenge.is_none() => {
                pending.cell = grid.nudge(pending.cell, dx, dy);
                vec![Effect::Redraw]
            }
            _ => Vec::new(),
        }
    }

    /// Live palette preview for the pending selection.
    pub fn choose_color(&mut self, layers: &mut LayerStack, color: Color) -> Vec<Effect> {
        match layers.preview.pending.as_mut() {
            Some(pending) => {
                pending.color = Some(color);
                vec![Effect::Redraw]
            }
            None => Vec::new(),
        }
    }

    /// Close the palette without confirming.
    pub fn cancel_selection(&mut self, layers: &mut LayerStack) -> Vec<Effect> {
        if layers.preview.pending.take().is_some() { vec![Effect::Redraw] } else { Vec::new() }
    }

    /// Confirm the pending selection. A no-op while cooling down, while a
    /// challenge is open, or before a colour has been picked.
    pub fn confirm(&mut self, layers: &mut LayerStack, now_ms: f64) -> Vec<Effect> {
        let Some(PendingSelection { cell, color: Some(color) }) = layers.preview.pending else {
            return Vec::new();
        };
        if self.is_eliminated() {
            return vec![Effect::Notice(Notice::Eliminated)];
        }
        if self.challenge.is_some() || self.cooldown.is_active(now_ms) {
            tracing::debug!(x = cell.x, y = cell.y, "confirm ignored");
            return Vec::new();
        }

        let current = layers.read_cell(cell).unwrap_or(self.background);
        let question = match self.rules.gate(current, self.background) {
            Gate::Challenge => self.pick_question(),
            Gate::Commit => None,
        };
        // An empty question bank skips the challenge.
        if let Some(question) = question {
            let open = OpenChallenge {
                question,
                cell,
                color,
                deadline_ms: now_ms + self.rules.challenge_timeout_ms,
            };
            let opened = view(&open, now_ms);
            self.challenge = Some(open);
            layers.preview.pending = None;
            tracing::debug!(x = cell.x, y = cell.y, "challenge opened");
            return vec![Effect::ChallengeOpened(opened), Effect::Redraw];
        }

        self.commit(layers, cell, color, now_ms, SyncRequest::SubmitEdit { cell, color })
    }

    fn pick_question(&mut self) -> Option<ChallengeQuestion> {
        if self.questions.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..self.questions.len());
        self.questions.get(idx).cloned()
    }

    /// Answer the open challenge with the index of a choice.
    pub fn answer_challenge(&mut self, layers: &mut LayerStack, choice: usize, now_ms: f64) -> Vec<Effect> {
        let Some(open) = self.challenge.take() else {
            return Vec::new();
        };
        if now_ms >= open.deadline_ms {
            return self.fail_challenge(&open, now_ms, true);
        }
        if choice != open.question.answer {
            return self.fail_challenge(&open, now_ms, false);
        }
        let mut effects = vec![Effect::ChallengeClosed];
        let request = SyncRequest::SubmitChallengeResult { cell: open.cell, color: open.color, success: true };
        effects.extend(self.commit(layers, open.cell, open.color, now_ms, request));
        effects
    }

    fn commit(&mut self, layers: &mut LayerStack, cell: Cell, color: Color, now_ms: f64, request: SyncRequest) -> Vec<Effect> {
        layers.preview.preview = Some(PreviewPixel { cell, color, expires_at_ms: now_ms + self.preview_duration_ms });
        layers.paint_cell(cell, color);
        layers.preview.pending = None;
        self.cooldown.start(now_ms, self.rules.cooldown_secs);
        self.reported = self.cooldown.state(now_ms);
        tracing::debug!(x = cell.x, y = cell.y, color = %color, "edit committed");
        vec![Effect::Submit(request), Effect::CooldownChanged(self.reported), Effect::Redraw]
    }

    /// Discard the edit, report the result, start the cooldown, charge a life.
    fn fail_challenge(&mut self, open: &OpenChallenge, now_ms: f64, timed_out: bool) -> Vec<Effect> {
        self.cooldown.start(now_ms, self.rules.cooldown_secs);
        self.reported = self.cooldown.state(now_ms);
        self.lives = self.lives.map(|n| n.saturating_sub(1));
        let lives_left = self.lives;
        let notice = if timed_out { Notice::ChallengeTimedOut { lives_left } } else { Notice::ChallengeFailed { lives_left } };
        tracing::debug!(x = open.cell.x, y = open.cell.y, timed_out, "challenge failed");

        let mut effects = vec![
            Effect::ChallengeClosed,
            Effect::Submit(SyncRequest::SubmitChallengeResult { cell: open.cell, color: open.color, success: false }),
            Effect::CooldownChanged(self.reported),
            Effect::Notice(notice),
        ];
        if self.is_eliminated() {
            effects.push(Effect::Notice(Notice::Eliminated));
        }
        effects.push(Effect::Redraw);
        effects
    }

    // --- Clock ---

    /// Expire timers. Call from the frame loop or a one-second interval.
    pub fn tick(&mut self, layers: &mut LayerStack, now_ms: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(open) = self.challenge.take_if(|c| now_ms >= c.deadline_ms) {
            effects.extend(self.fail_challenge(&open, now_ms, true));
        }
        let state = self.cooldown.state(now_ms);
        if state != self.reported {
            self.reported = state;
            effects.push(Effect::CooldownChanged(state));
        }
        if layers.preview.expire(now_ms) {
            effects.push(Effect::Redraw);
        }
        effects
    }

    // --- Remote events ---

    /// Server-pushed cooldown state replaces whatever was counting locally.
    pub fn apply_cooldown_notice(&mut self, active: bool, remaining_seconds: u32, now_ms: f64) -> Vec<Effect> {
        if active {
            self.cooldown.start(now_ms, remaining_seconds);
        } else {
            self.cooldown.clear();
        }
        self.reported = self.cooldown.state(now_ms);
        vec![Effect::CooldownChanged(self.reported)]
    }

    /// Write a remote edit. Idempotent and never gated by the cooldown.
    pub fn apply_remote_pixel(&mut self, layers: &mut LayerStack, cell: Cell, color: Color) -> Vec<Effect> {
        if !layers.grid().contains(cell) {
            tracing::warn!(x = cell.x, y = cell.y, "remote pixel outside grid");
            return Vec::new();
        }
        let painted = layers.paint_cell(cell, color);
        let superseded = layers.preview.supersede(cell);
        if painted || superseded { vec![Effect::Redraw] } else { Vec::new() }
    }

    /// The server refused an edit already drawn optimistically. The pixel stays.
    pub fn apply_rejection(&mut self, message: String, remaining_seconds: Option<u32>, now_ms: f64) -> Vec<Effect> {
        tracing::warn!(%message, ?remaining_seconds, "edit rejected");
        let mut effects = vec![Effect::Notice(Notice::EditRejected { message })];
        if let Some(secs) = remaining_seconds {
            effects.extend(self.apply_cooldown_notice(secs > 0, secs, now_ms));
        }
        effects
    }

    /// Another user's action removed cells: write them and make them blink.
    pub fn apply_peer_removed(&mut self, layers: &mut LayerStack, cells: &[(Cell, Color)], actor_name: String, now_ms: f64) -> Vec<Effect> {
        let grid = layers.grid();
        let inside: Vec<(Cell, Color)> = cells.iter().copied().filter(|(c, _)| grid.contains(*c)).collect();
        for &(cell, color) in &inside {
            layers.paint_cell(cell, color);
            layers.preview.supersede(cell);
        }
        layers.preview.flag(inside.iter().map(|(c, _)| *c), now_ms + self.flag_duration_ms);
        vec![Effect::Notice(Notice::PeerRemoved { actor_name, cells: inside.len() }), Effect::Redraw]
    }
}

fn view(open: &OpenChallenge, now_ms: f64) -> ChallengeView {
    ChallengeView {
        prompt: open.question.prompt.clone(),
        choices: open.question.choices.clone(),
        cell: open.cell,
        remaining_ms: (open.deadline_ms - now_ms).max(0.0),
    }
}
