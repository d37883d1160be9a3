//! Interaction rule sets layered over the shared gesture/render core.
//!
//! A [`Mode`] picks one [`ModeRules`] record; the placement protocol consults
//! it at confirm time through [`ModeRules::gate`] instead of forking the
//! engine per game variant.

#[cfg(test)]
#[path = "mode_test.rs"]
mod mode_test;

use serde::{Deserialize, Deserializer, Serialize};

use crate::color::Color;
use crate::consts::{CHALLENGE_TIMEOUT_MS, ELIMINATION_LIVES};

/// Which rule set governs confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Plain drawing: any cell, cooldown only.
    #[default]
    Freeform,
    /// Painting over a non-background cell requires answering a timed question.
    TimedChallenge,
    /// As `TimedChallenge`, but wrong answers cost lives and zero lives ends play.
    Elimination,
}

/// Tunables for one [`Mode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeRules {
    /// Cooldown started by every confirm (successful or not).
    pub cooldown_secs: u32,
    /// Whether confirming onto a non-background cell opens a challenge.
    pub challenge_on_painted: bool,
    /// Time allowed to answer a challenge.
    pub challenge_timeout_ms: f64,
    /// Starting lives; `None` means lives are not tracked.
    pub lives: Option<u32>,
}

impl Default for ModeRules {
    fn default() -> Self {
        Self::for_mode(Mode::Freeform)
    }
}

impl ModeRules {
    /// Built-in rule set for `mode`.
    #[must_use]
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Freeform => Self {
                cooldown_secs: 5,
                challenge_on_painted: false,
                challenge_timeout_ms: CHALLENGE_TIMEOUT_MS,
                lives: None,
            },
            Mode::TimedChallenge => Self {
                cooldown_secs: 10,
                challenge_on_painted: true,
                challenge_timeout_ms: CHALLENGE_TIMEOUT_MS,
                lives: None,
            },
            Mode::Elimination => Self {
                cooldown_secs: 10,
                challenge_on_painted: true,
                challenge_timeout_ms: CHALLENGE_TIMEOUT_MS,
                lives: Some(ELIMINATION_LIVES),
            },
        }
    }

    /// Read a partial rule set, filling absent keys from `mode`'s built-in
    /// rules rather than from [`ModeRules::default`].
    ///
    /// # Errors
    ///
    /// Propagates the deserializer's error for malformed values.
    pub fn deserialize_for<'de, D: Deserializer<'de>>(mode: Mode, deserializer: D) -> Result<Self, D::Error> {
        let patch = RulesPatch::deserialize(deserializer)?;
        let base = Self::for_mode(mode);
        Ok(Self {
            cooldown_secs: patch.cooldown_secs.unwrap_or(base.cooldown_secs),
            challenge_on_painted: patch.challenge_on_painted.unwrap_or(base.challenge_on_painted),
            challenge_timeout_ms: patch.challenge_timeout_ms.unwrap_or(base.challenge_timeout_ms),
            lives: patch.lives.or(base.lives),
        })
    }

    /// Decide what a confirm onto a cell currently painted `current` does.
    ///
    /// The blocked-cell check is exact RGBA equality with `background`.
    #[must_use]
    pub fn gate(&self, current: Color, background: Color) -> Gate {
        if self.challenge_on_painted && current != background {
            Gate::Challenge
        } else {
            Gate::Commit
        }
    }
}

/// The keys of a [`ModeRules`] override, each optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RulesPatch {
    cooldown_secs: Option<u32>,
    challenge_on_painted: Option<bool>,
    challenge_timeout_ms: Option<f64>,
    lives: Option<u32>,
}

/// Outcome of [`ModeRules::gate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Apply the edit immediately.
    Commit,
    /// Ask a question first.
    Challenge,
}

/// One multiple-choice question offered by a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeQuestion {
    pub prompt: String,
    pub choices: Vec<String>,
    /// Index into `choices` of the correct answer.
    pub answer: usize,
}

impl ChallengeQuestion {
    /// A question is usable when it has choices and its answer points at one.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.answer < self.choices.len()
    }
}
